//! Type codec: maps values to a type tag plus a textual payload and back.
//!
//! Primitives become text. Composites are handed back as their children so
//! the document layer can nest them, each child carrying its own tag.

use crate::error::{Error, Result};
use crate::value::{TypeTag, Value};
use std::collections::BTreeMap;

/// Payload of an encoded value.
#[derive(Debug, PartialEq)]
pub enum Payload<'a> {
    /// No content at all (`None`).
    Empty,
    /// Text content of a primitive.
    Text(String),
    /// Elements of a list or tuple, in order.
    Items(&'a [Value]),
    /// Fields of a dict.
    Fields(&'a BTreeMap<String, Value>),
}

/// Encode a value into its tag and payload.
///
/// Strings are checked for characters the document can't carry; composites
/// are checked recursively as the document layer walks into them.
pub fn encode(value: &Value) -> Result<(TypeTag, Payload<'_>)> {
    let payload = match value {
        Value::Int(i) => Payload::Text(i.to_string()),
        // Debug gives the shortest text that parses back to the same value;
        // every NaN is written as `NaN`.
        Value::Float(x) => Payload::Text(format!("{x:?}")),
        Value::Bool(b) => Payload::Text(if *b { "true" } else { "false" }.to_owned()),
        Value::Str(s) => {
            check_text(s)?;
            Payload::Text(s.clone())
        }
        Value::None => Payload::Empty,
        Value::List(items) | Value::Tuple(items) => Payload::Items(items),
        Value::Dict(fields) => {
            for key in fields.keys() {
                check_text(key)?;
            }
            Payload::Fields(fields)
        }
    };
    Ok((value.type_tag(), payload))
}

/// Decode the text found under a primitive tag.
///
/// Composite tags have no textual form and are rejected here; the document
/// layer rebuilds them from child nodes.
pub fn decode(tag: TypeTag, text: &str) -> Result<Value> {
    match tag {
        TypeTag::Int => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| Error::Decode(format!("{text:?} is not a valid int: {e}"))),
        TypeTag::Float => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| Error::Decode(format!("{text:?} is not a valid float: {e}"))),
        TypeTag::Bool => match text.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(Error::Decode(format!("{text:?} is not a valid bool"))),
        },
        TypeTag::Str => Ok(Value::Str(text.to_owned())),
        TypeTag::None if text.trim().is_empty() => Ok(Value::None),
        TypeTag::None => Err(Error::Decode(format!(
            "none carries no payload, found {text:?}"
        ))),
        TypeTag::Dict | TypeTag::List | TypeTag::Tuple => Err(Error::Decode(format!(
            "{tag} has no textual form"
        ))),
    }
}

/// Parse a type tag name, then decode `text` under it.
pub fn decode_tagged(tag: &str, text: &str) -> Result<Value> {
    decode(tag.parse()?, text)
}

/// Deepest nesting a value may have: a top-level value sits at depth 0 and
/// each list, tuple or dict adds one level for its children. Rendering,
/// parsing and [`check`] all enforce it, so no recursion over a value runs
/// unbounded.
pub const MAX_DEPTH: usize = 128;

/// Walk a value tree and fail on anything [`encode`] would reject, or on
/// nesting deeper than [`MAX_DEPTH`].
pub fn check(value: &Value) -> Result<()> {
    check_at(value, 0)
}

fn check_at(value: &Value, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(too_deep());
    }
    match value {
        Value::Str(s) => check_text(s),
        Value::List(items) | Value::Tuple(items) => {
            items.iter().try_for_each(|v| check_at(v, depth + 1))
        }
        Value::Dict(fields) => fields.iter().try_for_each(|(k, v)| {
            check_text(k)?;
            check_at(v, depth + 1)
        }),
        _ => Ok(()),
    }
}

pub(crate) fn too_deep() -> Error {
    Error::Encode(format!("value is nested more than {MAX_DEPTH} levels deep"))
}

/// Keys and strings must be representable in an XML 1.0 document.
pub fn check_text(s: &str) -> Result<()> {
    match s.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(Error::Encode(format!(
            "character U+{:04X} can't be stored in the document",
            c as u32
        ))),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}
