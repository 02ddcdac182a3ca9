//! Persistent, dictionary-like key-value store backed by a human-readable XML
//! file.
//!
//! Values are a closed set of types ([`Value`]: int, str, float, bool, none,
//! dict, list, tuple) and every value is written with its type tag, so a
//! tuple reloads as a tuple and `true` never comes back as `1`. Keys keep
//! their insertion order across reloads.
//!
//! ```rust,no_run
//! use datalink::{Datalink, Value};
//!
//! let mut db = Datalink::open("db.xml").unwrap();
//! db.set("name", "John").unwrap();
//! db.set("pair", (1, 2)).unwrap();
//! assert_eq!(db.get("name").unwrap(), &Value::from("John"));
//! ```
//!
//! Writes go to a temporary file that is renamed over the target, so readers
//! see either the old or the new document, never half of one.
//!
//! **Single-process only.** If multiple processes open the same file they will
//! clobber each other. Use advisory file locking or a real database for
//! multi-process access.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod document;
pub mod error;
mod legacy;
pub mod persist;
pub mod shared;
pub mod store;
pub mod sync;
pub mod value;

pub use document::{Document, Entry};
pub use error::{Error, Result};
pub use shared::SharedDatalink;
pub use store::{Datalink, DatalinkBuilder};
pub use sync::{SyncController, SyncPolicy};
pub use value::{from_value, to_value, TypeTag, Value};
