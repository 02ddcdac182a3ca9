use datalink::{Datalink, TypeTag, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn temp_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(format!("{name}.xml"))
}

/// Store `value` under "v", reopen the file and hand back what came out.
fn reload_one(value: Value) -> Value {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "one");
    Datalink::open(&path).unwrap().set("v", value).unwrap();
    Datalink::open(&path).unwrap().get("v").unwrap().clone()
}

fn dict(pairs: &[(&str, Value)]) -> Value {
    Value::Dict(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

#[test]
fn primitives_keep_their_type() {
    assert_eq!(reload_one(Value::Int(42)), Value::Int(42));
    assert_eq!(reload_one(Value::Int(i64::MIN)), Value::Int(i64::MIN));
    assert_eq!(reload_one(Value::Float(1.25)), Value::Float(1.25));
    assert_eq!(reload_one(Value::Float(3.0)), Value::Float(3.0));
    assert_eq!(reload_one(Value::Bool(true)), Value::Bool(true));
    assert_eq!(reload_one(Value::Bool(false)), Value::Bool(false));
    assert_eq!(reload_one(Value::from("string_value")), Value::from("string_value"));
    assert_eq!(reload_one(Value::None), Value::None);
}

#[test]
fn bool_and_int_stay_distinct() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "bool_int");
    {
        let mut db = Datalink::open(&path).unwrap();
        db.set("flag", true).unwrap();
        db.set("one", 1).unwrap();
        db.set("zero", 0).unwrap();
    }
    let db = Datalink::open(&path).unwrap();
    assert_eq!(db.get("flag").unwrap(), &Value::Bool(true));
    assert_eq!(db.get("one").unwrap(), &Value::Int(1));
    assert_eq!(db.get("zero").unwrap(), &Value::Int(0));
}

#[test]
fn float_edge_cases() {
    assert_eq!(reload_one(Value::Float(1e300)), Value::Float(1e300));
    assert_eq!(reload_one(Value::Float(5e-324)), Value::Float(5e-324));
    assert_eq!(
        reload_one(Value::Float(f64::INFINITY)),
        Value::Float(f64::INFINITY)
    );
    assert_eq!(
        reload_one(Value::Float(f64::NEG_INFINITY)),
        Value::Float(f64::NEG_INFINITY)
    );
    let nan = reload_one(Value::Float(f64::NAN));
    assert!(nan.as_float().unwrap().is_nan());
    let neg_zero = reload_one(Value::Float(-0.0)).as_float().unwrap();
    assert!(neg_zero == 0.0 && neg_zero.is_sign_negative());
    assert_eq!(
        reload_one(Value::Float(0.1 + 0.2)),
        Value::Float(0.1 + 0.2)
    );
}

#[test]
fn nan_reloads_as_nan_but_never_compares_equal() {
    let reloaded = reload_one(Value::Float(f64::NAN));
    assert!(reloaded.as_float().unwrap().is_nan());
    assert_ne!(reloaded, Value::Float(f64::NAN));
    assert_ne!(reloaded.clone(), reloaded);
}

#[test]
fn tuple_reloads_as_tuple_and_list_as_list() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "tuple_list");
    {
        let mut db = Datalink::open(&path).unwrap();
        db.set("x", (1, 2)).unwrap();
        db.set("y", vec![1, 2]).unwrap();
    }
    let db = Datalink::open(&path).unwrap();
    let x = db.get("x").unwrap();
    let y = db.get("y").unwrap();
    assert_eq!(x.type_tag(), TypeTag::Tuple);
    assert_eq!(x, &Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(y.type_tag(), TypeTag::List);
    assert_eq!(y, &Value::List(vec![Value::Int(1), Value::Int(2)]));
}

#[test]
fn heterogeneous_collections_keep_element_types() {
    let list = Value::List(vec![
        Value::Int(1),
        Value::from("two"),
        Value::Float(3.0),
        Value::Bool(true),
        Value::None,
    ]);
    assert_eq!(reload_one(list.clone()), list);

    let tuple = Value::from((1, 2, "three"));
    assert_eq!(reload_one(tuple.clone()), tuple);

    let d = dict(&[
        ("a", Value::Int(1)),
        ("b", Value::Int(2)),
        ("c", Value::from("three")),
    ]);
    assert_eq!(reload_one(d.clone()), d);
}

#[test]
fn nested_composites_round_trip() {
    let value = dict(&[
        (
            "matrix",
            Value::List(vec![
                Value::List(vec![Value::Int(1), Value::Int(2)]),
                Value::Tuple(vec![Value::Float(0.5), Value::None]),
            ]),
        ),
        (
            "inner",
            dict(&[
                ("nested", Value::from("value")),
                ("number", Value::Int(99)),
                ("empty", Value::List(vec![])),
            ]),
        ),
        ("single", Value::Tuple(vec![Value::from("only")])),
        ("unit", Value::Tuple(vec![])),
        ("blank", dict(&[])),
    ]);
    assert_eq!(reload_one(value.clone()), value);
}

#[test]
fn strings_survive_whitespace_and_markup() {
    let samples = [
        "",
        " ",
        "  padded  ",
        "line1\nline2\n",
        "crlf\r\nline",
        "lone\rcr",
        "tab\there",
        "<xml> & \"quotes\" 'apos'",
        "]]> not cdata",
        "&amp; already escaped",
        "Hello 世界 🌍",
    ];
    for s in samples {
        assert_eq!(reload_one(Value::from(s)), Value::from(s), "sample {s:?}");
    }
}

#[test]
fn special_keys_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "keys");
    let keys = [
        "key with spaces & symbols!@#$%",
        "",
        "quote\"and'apos",
        "multi\nline",
        "tab\tkey",
        "<angle>",
        "ключ",
    ];
    {
        let mut db = Datalink::open(&path).unwrap();
        for (i, k) in keys.iter().enumerate() {
            db.set(*k, i as i64).unwrap();
        }
        let mut nested = BTreeMap::new();
        nested.insert("inner\tkey \"q\"".to_string(), Value::Int(7));
        db.set("nested", Value::Dict(nested)).unwrap();
    }
    let db = Datalink::open(&path).unwrap();
    let loaded: Vec<&str> = db.keys().collect();
    assert_eq!(&loaded[..keys.len()], &keys[..]);
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(db.get(k).unwrap(), &Value::Int(i as i64));
    }
    let nested = db.get("nested").unwrap().as_dict().unwrap();
    assert_eq!(nested.get("inner\tkey \"q\""), Some(&Value::Int(7)));
}

#[test]
fn large_list_round_trips() {
    let large = Value::List((0..1000).map(Value::Int).collect());
    assert_eq!(reload_one(large.clone()), large);
}

#[test]
fn complex_data_persistence() {
    let dir = TempDir::new().unwrap();
    let path = temp_path(&dir, "complex");
    let data = vec![
        ("string", Value::from("test_string")),
        ("integer", Value::Int(123)),
        ("float", Value::Float(45.67)),
        ("boolean_true", Value::Bool(true)),
        ("boolean_false", Value::Bool(false)),
        (
            "list",
            Value::List(vec![Value::Int(1), Value::from("two"), Value::Float(3.0)]),
        ),
        (
            "dict",
            dict(&[("nested", Value::from("value")), ("number", Value::Int(99))]),
        ),
        ("tuple", Value::from((1, 2, "three"))),
    ];
    {
        let mut db = Datalink::open_with_auto_sync(&path, false).unwrap();
        db.extend(data.clone()).unwrap();
        db.flush().unwrap();
    }
    let db = Datalink::open(&path).unwrap();
    for (key, expected) in &data {
        assert_eq!(db.get(key).unwrap(), expected, "key {key}");
    }
}

#[test]
fn conversions_pick_the_right_variant() {
    assert_eq!(Value::from(7u32), Value::Int(7));
    assert_eq!(Value::from(Some("x")), Value::from("x"));
    assert_eq!(Value::from(None::<i64>), Value::None);
    assert_eq!(Value::from(()), Value::None);
    assert_eq!(
        Value::from(("a", 1)),
        Value::Tuple(vec![Value::from("a"), Value::Int(1)])
    );
    assert_eq!(
        Value::from(vec!["a", "b"]),
        Value::List(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn display_is_readable() {
    let v = Value::List(vec![
        Value::Int(1),
        Value::from("two"),
        Value::Tuple(vec![Value::Float(3.0)]),
        Value::None,
        dict(&[("k", Value::Bool(false))]),
    ]);
    assert_eq!(v.to_string(), r#"[1, "two", (3.0,), None, {"k": false}]"#);
    assert_eq!(TypeTag::Tuple.to_string(), "tuple");
}
