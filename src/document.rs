//! Document model: the ordered, typed entries of a store and their XML form.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <datalink version="1">
//!   <entry key="name" type="str">John</entry>
//!   <entry key="pair" type="tuple">
//!     <item type="int">1</item>
//!     <item type="int">2</item>
//!   </entry>
//!   <entry key="nothing" type="none"/>
//! </datalink>
//! ```
//!
//! Dict children carry a `key` attribute; list and tuple children don't.

use crate::codec::{self, Payload};
use crate::error::{Error, Result};
use crate::legacy;
use crate::value::{TypeTag, Value};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

/// Name of the root element written by [`render`].
pub const ROOT: &str = "datalink";
/// Value of the root `version` attribute.
pub const FORMAT_VERSION: &str = "1";

const ENTRY: &str = "entry";
const ITEM: &str = "item";

/// One key/value pair of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Unique key within the document.
    pub key: String,
    /// The stored value.
    pub value: Value,
}

impl Entry {
    /// Build an entry from anything convertible to a key and a value.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Tag written for this entry. Always derived from the value.
    pub fn type_tag(&self) -> TypeTag {
        self.value.type_tag()
    }
}

/// Ordered sequence of entries with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of `key`, if present.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Replace the value of an existing key in place, or append a new entry.
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].value, value)),
            None => {
                self.entries.push(Entry { key, value });
                None
            }
        }
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).value)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }

    pub(crate) fn value_at_mut(&mut self, index: usize) -> &mut Value {
        &mut self.entries[index].value
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

/// Render a document as XML. `pretty` indents nested nodes by two spaces;
/// otherwise everything goes on one line.
pub fn render(document: &Document, pretty: bool) -> Result<String> {
    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    let mut root = BytesStart::new(ROOT);
    root.push_attribute(("version", FORMAT_VERSION));
    if document.is_empty() {
        emit(&mut writer, Event::Empty(root))?;
    } else {
        emit(&mut writer, Event::Start(root))?;
        for entry in document {
            write_node(&mut writer, ENTRY, Some(&entry.key), &entry.value, 0)?;
        }
        emit(&mut writer, Event::End(BytesEnd::new(ROOT)))?;
    }

    let mut text = String::from_utf8(writer.into_inner())
        .map_err(|e| Error::Encode(format!("rendered document is not UTF-8: {e}")))?;
    if pretty {
        text.push('\n');
    }
    Ok(text)
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    key: Option<&str>,
    value: &Value,
    depth: usize,
) -> Result<()> {
    if depth > codec::MAX_DEPTH {
        return Err(codec::too_deep());
    }
    let (tag, payload) = codec::encode(value)?;
    let mut start = BytesStart::new(name);
    if let Some(key) = key {
        codec::check_text(key)?;
        start.push_attribute(Attribute {
            key: QName(b"key"),
            value: Cow::Owned(escape_attr(key).into_bytes()),
        });
    }
    start.push_attribute(("type", tag.as_str()));

    match payload {
        Payload::Text(text) if !text.is_empty() => {
            emit(writer, Event::Start(start))?;
            emit(writer, Event::Text(BytesText::from_escaped(escape_text(&text))))?;
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        Payload::Items(items) if !items.is_empty() => {
            emit(writer, Event::Start(start))?;
            for item in items {
                write_node(writer, ITEM, None, item, depth + 1)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        Payload::Fields(fields) if !fields.is_empty() => {
            emit(writer, Event::Start(start))?;
            for (k, v) in fields {
                write_node(writer, ITEM, Some(k), v, depth + 1)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        // Self-closing keeps the indenter from putting whitespace inside.
        _ => emit(writer, Event::Empty(start)),
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Encode(e.to_string()))
}

// XML parsers normalize raw CR (and, in attributes, tab and LF), so those go
// out as character references.
fn escape_text(s: &str) -> String {
    partial_escape(s).replace('\r', "&#xD;")
}

fn escape_attr(s: &str) -> String {
    escape(s)
        .replace('\r', "&#xD;")
        .replace('\n', "&#xA;")
        .replace('\t', "&#x9;")
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Current,
    Legacy,
}

/// Parse a document. Blank input yields an empty document.
///
/// Accepts the layout produced by [`render`] as well as the older
/// `<keyval><key/><value dtype=".."/></keyval>` layout, which is imported
/// and rewritten in the current layout on the next sync. Duplicate keys are
/// rejected.
pub fn parse(text: &str) -> Result<Document> {
    let mut document = Document::new();
    if text.trim().is_empty() {
        return Ok(document);
    }

    let mut cursor = XmlCursor::new(text);
    let root = cursor
        .root()?
        .ok_or_else(|| malformed("document has no root element"))?;

    if root.is_open() {
        let mut layout = None;
        let mut seen = HashSet::new();
        while let Some(child) = cursor.next_child()? {
            let kind = match child.start().name().as_ref() {
                b"entry" => Layout::Current,
                b"keyval" => Layout::Legacy,
                other => {
                    return Err(malformed(format!(
                        "unexpected element <{}> in document root",
                        String::from_utf8_lossy(other)
                    )))
                }
            };
            if *layout.get_or_insert(kind) != kind {
                return Err(malformed("document mixes <entry> and <keyval> elements"));
            }
            let entry = match kind {
                Layout::Current => parse_entry(&mut cursor, child)?,
                Layout::Legacy => legacy::parse_keyval(&mut cursor, child)?,
            };
            if !seen.insert(entry.key.clone()) {
                return Err(malformed(format!("duplicate key {:?}", entry.key)));
            }
            document.push(entry);
        }
    }

    cursor.finish()?;
    Ok(document)
}

fn parse_entry<'a>(cursor: &mut XmlCursor<'a>, node: Node<'a>) -> Result<Entry> {
    let key = attribute(node.start(), b"key")?
        .ok_or_else(|| malformed("<entry> is missing its key attribute"))?;
    let value = parse_value(cursor, node, 0)?;
    Ok(Entry { key, value })
}

fn parse_value<'a>(cursor: &mut XmlCursor<'a>, node: Node<'a>, depth: usize) -> Result<Value> {
    let name = node.name();
    if depth > codec::MAX_DEPTH {
        return Err(malformed(format!(
            "<{name}> is nested more than {} levels deep",
            codec::MAX_DEPTH
        )));
    }
    let tag_name = attribute(node.start(), b"type")?
        .ok_or_else(|| malformed(format!("<{name}> is missing its type attribute")))?;
    let tag: TypeTag = tag_name
        .parse()
        .map_err(|_| malformed(format!("unknown type tag {tag_name:?} on <{name}>")))?;

    if !tag.is_composite() {
        let text = if node.is_open() {
            cursor.read_text()?
        } else {
            String::new()
        };
        return codec::decode(tag, &text);
    }

    let mut items = Vec::new();
    let mut fields = BTreeMap::new();
    if node.is_open() {
        while let Some(child) = cursor.next_child()? {
            if child.start().name().as_ref() != ITEM.as_bytes() {
                return Err(malformed(format!(
                    "unexpected element <{}> inside {tag}",
                    child.name()
                )));
            }
            let key = attribute(child.start(), b"key")?;
            match (tag, key) {
                (TypeTag::Dict, Some(key)) => {
                    let value = parse_value(cursor, child, depth + 1)?;
                    if fields.insert(key.clone(), value).is_some() {
                        return Err(malformed(format!("duplicate dict key {key:?}")));
                    }
                }
                (TypeTag::Dict, None) => {
                    return Err(malformed("dict <item> is missing its key attribute"))
                }
                (_, Some(key)) => {
                    return Err(malformed(format!("{tag} <item> has a stray key {key:?}")))
                }
                (_, None) => items.push(parse_value(cursor, child, depth + 1)?),
            }
        }
    }

    Ok(match tag {
        TypeTag::Dict => Value::Dict(fields),
        TypeTag::List => Value::List(items),
        _ => Value::Tuple(items),
    })
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::MalformedDocument(msg.into())
}

/// Look up an attribute by name and unescape its value.
pub(crate) fn attribute(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(format!("bad attribute: {e}")))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| malformed(format!("bad attribute value: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// An element just opened by the cursor.
pub(crate) enum Node<'a> {
    /// `<x ...>`: content and a closing tag follow.
    Open(BytesStart<'a>),
    /// `<x .../>`: nothing follows.
    Leaf(BytesStart<'a>),
}

impl<'a> Node<'a> {
    pub(crate) fn start(&self) -> &BytesStart<'a> {
        match self {
            Node::Open(s) | Node::Leaf(s) => s,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(self, Node::Open(_))
    }

    pub(crate) fn name(&self) -> String {
        String::from_utf8_lossy(self.start().name().as_ref()).into_owned()
    }
}

/// Pull-style walk over the XML events of a document.
pub(crate) struct XmlCursor<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> XmlCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            reader: Reader::from_str(text),
        }
    }

    fn next_event(&mut self) -> Result<Event<'a>> {
        match self.reader.read_event() {
            Ok(event) => Ok(event),
            Err(e) => Err(malformed(format!(
                "{e} (near byte {})",
                self.reader.buffer_position()
            ))),
        }
    }

    /// Skip the prolog and return the root element, or `None` if the input
    /// holds no element at all.
    fn root(&mut self) -> Result<Option<Node<'a>>> {
        loop {
            match self.next_event()? {
                Event::Start(e) => return Ok(Some(Node::Open(e))),
                Event::Empty(e) => return Ok(Some(Node::Leaf(e))),
                Event::Text(t) => ensure_blank(&unescape(&t)?)?,
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::End(_) => return Err(malformed("closing tag before the root element")),
                Event::CData(_) => return Err(malformed("CDATA outside the root element")),
                Event::Eof => return Ok(None),
            }
        }
    }

    /// Next child element of the currently open element, or `None` once its
    /// closing tag is consumed. Whitespace and comments between children are
    /// skipped; any other text is an error.
    pub(crate) fn next_child(&mut self) -> Result<Option<Node<'a>>> {
        loop {
            match self.next_event()? {
                Event::Start(e) => return Ok(Some(Node::Open(e))),
                Event::Empty(e) => return Ok(Some(Node::Leaf(e))),
                Event::End(_) => return Ok(None),
                Event::Text(t) => ensure_blank(&unescape(&t)?)?,
                Event::CData(c) => ensure_blank(&cdata(c)?)?,
                Event::Comment(_) | Event::PI(_) => {}
                Event::Decl(_) | Event::DocType(_) => {
                    return Err(malformed("declaration inside an element"))
                }
                Event::Eof => return Err(malformed("unexpected end of document: unclosed element")),
            }
        }
    }

    /// Text content of the currently open element, consuming its closing tag.
    pub(crate) fn read_text(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.next_event()? {
                Event::Text(t) => out.push_str(&unescape(&t)?),
                Event::CData(c) => out.push_str(&cdata(c)?),
                Event::End(_) => return Ok(out),
                Event::Start(e) | Event::Empty(e) => {
                    return Err(malformed(format!(
                        "unexpected element <{}> inside text content",
                        String::from_utf8_lossy(e.name().as_ref())
                    )))
                }
                Event::Comment(_) | Event::PI(_) => {}
                Event::Decl(_) | Event::DocType(_) => {
                    return Err(malformed("declaration inside an element"))
                }
                Event::Eof => return Err(malformed("unexpected end of document: unclosed element")),
            }
        }
    }

    /// Text of `node`: its content if open, empty if self-closing.
    pub(crate) fn text_of(&mut self, node: &Node<'a>) -> Result<String> {
        if node.is_open() {
            self.read_text()
        } else {
            Ok(String::new())
        }
    }

    /// Only whitespace, comments and processing instructions may follow the
    /// root element.
    fn finish(&mut self) -> Result<()> {
        loop {
            match self.next_event()? {
                Event::Eof => return Ok(()),
                Event::Text(t) => ensure_blank(&unescape(&t)?)?,
                Event::Comment(_) | Event::PI(_) => {}
                _ => return Err(malformed("content after the root element")),
            }
        }
    }
}

fn unescape(text: &BytesText<'_>) -> Result<String> {
    text.unescape()
        .map(Cow::into_owned)
        .map_err(|e| malformed(format!("bad text content: {e}")))
}

fn cdata(data: quick_xml::events::BytesCData<'_>) -> Result<String> {
    let raw = data.into_inner();
    std::str::from_utf8(&raw)
        .map(str::to_owned)
        .map_err(|e| malformed(format!("CDATA is not UTF-8: {e}")))
}

fn ensure_blank(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        Ok(())
    } else {
        Err(malformed(format!("unexpected text {:?}", text.trim())))
    }
}
