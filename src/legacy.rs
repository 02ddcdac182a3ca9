//! Import of the older `<keyval>` document layout.
//!
//! ```text
//! <?xml version='1.0' encoding='utf-8'?>
//! <pyhold>
//!   <keyval><key>age</key><value dtype="int">25</value></keyval>
//!   <keyval><key>tags</key><value dtype="list">["a", 1]</value></keyval>
//! </pyhold>
//! ```
//!
//! Types are named after Python's (`int`, `float`, `bool` written as
//! `True`/`False`, `str`, `NoneType`) and composites are JSON text. Files in
//! this layout are read only; the next sync rewrites them in the current one.

use crate::codec;
use crate::document::{attribute, Entry, Node, XmlCursor};
use crate::error::{Error, Result};
use crate::value::{TypeTag, Value};

pub(crate) fn parse_keyval<'a>(cursor: &mut XmlCursor<'a>, node: Node<'a>) -> Result<Entry> {
    if !node.is_open() {
        return Err(malformed("<keyval> has no <key> or <value>"));
    }

    let mut key = None;
    let mut value = None;
    while let Some(child) = cursor.next_child()? {
        match child.start().name().as_ref() {
            b"key" => {
                let text = cursor.text_of(&child)?;
                if key.replace(text).is_some() {
                    return Err(malformed("<keyval> has more than one <key>"));
                }
            }
            b"value" => {
                let dtype = attribute(child.start(), b"dtype")?;
                let text = cursor.text_of(&child)?;
                let decoded = decode(dtype.as_deref().unwrap_or("str"), &text)?;
                if value.replace(decoded).is_some() {
                    return Err(malformed("<keyval> has more than one <value>"));
                }
            }
            other => {
                return Err(malformed(format!(
                    "unexpected element <{}> inside <keyval>",
                    String::from_utf8_lossy(other)
                )))
            }
        }
    }

    let key = key.ok_or_else(|| malformed("<keyval> is missing its <key>"))?;
    let value = value.ok_or_else(|| malformed(format!("<keyval> {key:?} is missing its <value>")))?;
    Ok(Entry { key, value })
}

/// Decode one legacy payload. Unknown type names fall back to text; a text
/// payload of exactly `None` decodes as None.
fn decode(dtype: &str, text: &str) -> Result<Value> {
    match dtype {
        "int" => codec::decode(TypeTag::Int, text),
        "float" => codec::decode(TypeTag::Float, text),
        "bool" => Ok(Value::Bool(text.trim() == "True")),
        "dict" | "list" => Ok(serde_json::from_str::<serde_json::Value>(text)?.into()),
        "tuple" => match serde_json::from_str::<serde_json::Value>(text)? {
            serde_json::Value::Array(items) => {
                Ok(Value::Tuple(items.into_iter().map(Value::from).collect()))
            }
            other => Err(Error::Decode(format!(
                "tuple payload must be a JSON array, found {other}"
            ))),
        },
        "NoneType" => Ok(Value::None),
        _ if text == "None" => Ok(Value::None),
        _ => Ok(Value::Str(text.to_owned())),
    }
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::MalformedDocument(msg.into())
}
