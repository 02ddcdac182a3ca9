use datalink::{Datalink, SharedDatalink};
use std::thread;

fn main() -> datalink::Result<()> {
    let path = std::env::temp_dir().join("datalink_example_shared.xml");
    let _ = std::fs::remove_file(&path);

    let shared = SharedDatalink::new(Datalink::open_with_auto_sync(&path, false)?);

    let workers: Vec<_> = (0..4)
        .map(|id| {
            let db = shared.clone();
            thread::spawn(move || -> datalink::Result<()> {
                for n in 0..5 {
                    db.with(|db| db.set(format!("worker{id}_{n}"), n))?;
                }
                Ok(())
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked")?;
    }

    println!("entries written: {}", shared.lock().len());
    if let Ok(db) = shared.try_unwrap() {
        db.close()?;
    }

    let reopened = Datalink::open(&path)?;
    println!("entries on disk: {}", reopened.len());
    drop(reopened);

    let _ = std::fs::remove_file(&path);
    Ok(())
}
