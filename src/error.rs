//! Unified error type for all store operations.

use std::fmt::Display;

/// Things that can go wrong when using the store.
///
/// Every variant carries a rendered message rather than the source error so
/// the type stays `Clone + Eq` and easy to match on in tests.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A value can't be represented in the document (bad characters,
    /// unsupported serde shape, out-of-range integer).
    #[error("encode error: {0}")]
    Encode(String),
    /// Text under a type tag doesn't parse as that type, or a value doesn't
    /// fit the Rust type it's being deserialized into.
    #[error("decode error: {0}")]
    Decode(String),
    /// The file isn't a well-formed datalink document.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// Lookup or removal of a key that isn't in the store.
    #[error("key not found: {0:?}")]
    KeyNotFound(String),
    /// File system problem while loading or syncing (create, write, rename).
    #[error("persistence error: {0}")]
    Persistence(String),
    /// Bad configuration (invalid path, etc.).
    #[error("config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::MalformedDocument(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Persistence(err.to_string())
        } else {
            Error::Decode(err.to_string())
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Encode(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Decode(msg.to_string())
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
