use datalink::Datalink;
use tracing_subscriber::EnvFilter;

fn main() -> datalink::Result<()> {
    // RUST_LOG=datalink=trace shows every sync
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("datalink_example_builder.xml");

    // compact output, writes deferred until flush / close
    let mut db = Datalink::builder(&path)
        .auto_sync(false)
        .pretty(false)
        .build()?;

    db.set("name", "datalink")?;
    db.set("version", "0.1.0")?;
    db.set("features", vec!["auto-sync", "atomic writes"])?;
    println!("dirty before flush: {}", db.is_dirty());
    db.flush()?;
    println!("dirty after flush:  {}", db.is_dirty());

    let contents = std::fs::read_to_string(db.path())?;
    println!("On-disk document:\n{contents}");

    println!("\nDebug output: {db:?}");

    db.close()?;
    let _ = std::fs::remove_file(&path);
    Ok(())
}
