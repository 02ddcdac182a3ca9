use datalink::{Datalink, Value};

fn main() -> datalink::Result<()> {
    let path = std::env::temp_dir().join("datalink_example_basic.xml");
    let mut db = Datalink::open(&path)?;

    // set / get / delete, each one written straight to disk
    db.set("apples", 3)?;
    db.set("bananas", 5)?;
    db.set("basket", ("wicker", 2.5))?;
    println!("apples  = {}", db.get("apples")?);
    println!("basket  = {}", db.get("basket")?);

    // update in place
    db.update("apples", |v| *v = Value::Int(v.as_int().unwrap_or(0) + 1))?;
    println!("apples after update = {}", db.get("apples")?);

    // get_or_insert_with
    let oranges = db.get_or_insert_with("oranges", || 0)?;
    println!("oranges (default 0) = {oranges}");

    // bulk insert, one write for the whole batch
    db.extend(vec![("grapes", 12), ("lemons", 7)])?;

    for (key, value) in db.items() {
        println!("{key:>8} : {value} ({})", value.type_tag());
    }
    println!("len    = {}", db.len());

    db.delete("bananas")?;
    match db.get("bananas") {
        Err(e) => println!("after delete: {e}"),
        Ok(v) => println!("still there? {v}"),
    }

    let contents = std::fs::read_to_string(db.path())?;
    println!("\nOn-disk document:\n{contents}");

    db.close()?;
    let _ = std::fs::remove_file(&path);
    Ok(())
}
