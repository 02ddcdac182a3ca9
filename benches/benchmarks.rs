use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use datalink::document::{parse, render};
use datalink::{Datalink, Document, Value};
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn bench_path(name: &str, size: usize) -> PathBuf {
    std::env::temp_dir().join(format!("datalink_bench_{}_{}.xml", name, size))
}

fn deferred(path: &Path) -> Datalink {
    let _ = std::fs::remove_file(path);
    Datalink::open_with_auto_sync(path, false).unwrap()
}

fn sample_value(i: usize) -> Value {
    Value::from((i as i64, format!("name {i}"), vec![1.5, 2.5]))
}

fn bench_set_get_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_get_delete");
    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("deferred", size), &size, |b, &size| {
            let path = bench_path("sgd", size);
            let mut db = deferred(&path);
            b.iter(|| {
                for i in 0..size {
                    db.set(format!("k{i}"), i as i64).unwrap();
                }
                for i in 0..size {
                    black_box(db.get(&format!("k{i}")).unwrap());
                }
                for i in 0..size {
                    db.delete(&format!("k{i}")).unwrap();
                }
            });
            drop(db);
            let _ = std::fs::remove_file(&path);
        });
    }
}

fn bench_auto_sync_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_sync_set");
    group.sample_size(20);
    for size in [10, 100] {
        group.bench_with_input(BenchmarkId::new("immediate", size), &size, |b, &size| {
            let path = bench_path("auto", size);
            let _ = std::fs::remove_file(&path);
            let mut db = Datalink::open(&path).unwrap();
            b.iter(|| {
                for i in 0..size {
                    db.set(format!("k{i}"), i as i64).unwrap();
                }
            });
            drop(db);
            let _ = std::fs::remove_file(&path);
        });
    }
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(8));
    for size in [100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::new("deferred", size), &size, |b, &size| {
            let path = bench_path("flush", size);
            let mut db = deferred(&path);
            for i in 0..size {
                db.set(format!("k{i}"), sample_value(i)).unwrap();
            }
            b.iter(|| db.flush().unwrap());
            drop(db);
            let _ = std::fs::remove_file(&path);
        });
    }
}

fn bench_extend(c: &mut Criterion) {
    let mut group = c.benchmark_group("extend");
    for size in [100, 1000] {
        group.bench_with_input(BenchmarkId::new("deferred", size), &size, |b, &size| {
            let path = bench_path("extend", size);
            let mut db = deferred(&path);
            let batch: Vec<(String, Value)> =
                (0..size).map(|i| (format!("k{i}"), sample_value(i))).collect();
            b.iter(|| {
                db.extend(batch.clone()).unwrap();
                db.clear().unwrap();
            });
            drop(db);
            let _ = std::fs::remove_file(&path);
        });
    }
}

fn bench_render_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_parse");
    for size in [100, 1000] {
        let mut doc = Document::new();
        for i in 0..size {
            doc.insert(format!("k{i}"), sample_value(i));
        }
        let text = render(&doc, true).unwrap();
        group.bench_with_input(BenchmarkId::new("render", size), &doc, |b, doc| {
            b.iter(|| black_box(render(doc, true).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("parse", size), &text, |b, text| {
            b.iter(|| black_box(parse(text).unwrap()));
        });
    }
}

criterion_group!(
    benches,
    bench_set_get_delete,
    bench_auto_sync_set,
    bench_flush,
    bench_extend,
    bench_render_parse,
);
criterion_main!(benches);
