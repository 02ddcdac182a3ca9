//! Core store type and builder.

use crate::codec;
use crate::document::{self, Document, Entry};
use crate::error::{Error, Result};
use crate::persist;
use crate::sync::{SyncController, SyncPolicy};
use crate::value::{from_value, to_value, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Persistent, dictionary-like key-value store backed by an XML file.
///
/// Keys keep their insertion order; overwriting a key leaves it where it was.
/// With auto-sync on (the default) every mutation rewrites the file before
/// returning. With it off, changes accumulate until [`flush`](Self::flush),
/// [`close`](Self::close) or drop.
///
/// Mutation happens before the write, and a failed write is not rolled back:
/// on [`Error::Persistence`] memory is ahead of the file until the next
/// successful sync. Callers that need strict durability should check the
/// result of an explicit `flush()`.
///
/// Mutating methods take `&mut self`, so one instance can't be written from
/// two threads at once without a lock; see
/// [`SharedDatalink`](crate::SharedDatalink). Nothing stops two instances
/// (or two processes) from opening the same file, and they will clobber each
/// other if they do.
pub struct Datalink {
    document: Document,
    index: HashMap<String, usize>,
    sync: SyncController,
}

impl Datalink {
    /// Open (or create) a store at `path` with auto-sync on.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Open with auto-sync switched on or off. Shorthand for
    /// `builder(path).auto_sync(auto_sync).build()`.
    pub fn open_with_auto_sync(path: impl AsRef<Path>, auto_sync: bool) -> Result<Self> {
        Self::builder(path).auto_sync(auto_sync).build()
    }

    /// Start configuring a new store. Call [`.build()`](DatalinkBuilder::build)
    /// when ready.
    pub fn builder(path: impl AsRef<Path>) -> DatalinkBuilder {
        DatalinkBuilder::new(path)
    }

    // ---- reads ----

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.index
            .get(key)
            .map(|&i| &self.document.entries()[i].value)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))
    }

    /// Value stored under `key`, deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        from_value(self.get(key)?.clone())
    }

    /// `true` if the key exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.document.len()
    }

    /// `true` when the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.document.iter().map(|e| e.key.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.document.iter().map(|e| &e.value)
    }

    /// Key-value pairs in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.document.iter().map(|e| (e.key.as_str(), &e.value))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.document.iter()
    }

    /// The in-memory document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.sync.path()
    }

    /// `true` if every mutation is written immediately.
    #[must_use]
    pub fn auto_sync(&self) -> bool {
        self.sync.policy() == SyncPolicy::Immediate
    }

    /// `true` if there are changes the file doesn't have yet.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.sync.is_dirty()
    }

    // ---- writes ----

    /// Insert or overwrite `key`, returning the previous value. New keys go to
    /// the end; existing keys keep their position.
    ///
    /// The value is checked before anything changes, so an
    /// [`Error::Encode`] leaves the store untouched.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let value = value.into();
        codec::check_text(&key)?;
        codec::check(&value)?;
        let prev = self.put(key, value);
        self.sync.on_mutation(&self.document)?;
        Ok(prev)
    }

    /// Like [`set`](Self::set), converting any `Serialize` type first.
    pub fn set_serialized<T>(&mut self, key: impl Into<String>, value: &T) -> Result<Option<Value>>
    where
        T: ?Sized + Serialize,
    {
        let value = to_value(value)?;
        self.set(key, value)
    }

    /// Remove `key`.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.pop(key).map(drop)
    }

    /// Remove `key` and return its value.
    pub fn pop(&mut self, key: &str) -> Result<Value> {
        let i = self
            .index
            .remove(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))?;
        let entry = self.document.remove_at(i);
        for pos in self.index.values_mut() {
            if *pos > i {
                *pos -= 1;
            }
        }
        self.sync.on_mutation(&self.document)?;
        Ok(entry.value)
    }

    /// Drop all entries from the store.
    pub fn clear(&mut self) -> Result<()> {
        self.document.clear();
        self.index.clear();
        self.sync.on_mutation(&self.document)
    }

    /// Bulk-insert from an iterator. Every pair is checked before any is
    /// applied, and only one sync happens at the end.
    pub fn extend<I, K, V>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let batch = iter
            .into_iter()
            .map(|(k, v)| {
                let (k, v) = (k.into(), v.into());
                codec::check_text(&k)?;
                codec::check(&v)?;
                Ok((k, v))
            })
            .collect::<Result<Vec<_>>>()?;
        for (k, v) in batch {
            self.put(k, v);
        }
        self.sync.on_mutation(&self.document)
    }

    /// Mutate the value at `key` in place. Returns `false` if the key doesn't
    /// exist (nothing happens in that case).
    pub fn update<F>(&mut self, key: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Value),
    {
        let Some(&i) = self.index.get(key) else {
            return Ok(false);
        };
        let mut value = self.document.entries()[i].value.clone();
        f(&mut value);
        codec::check(&value)?;
        *self.document.value_at_mut(i) = value;
        self.sync.on_mutation(&self.document)?;
        Ok(true)
    }

    /// Return the value for `key`, inserting the result of `f` first if the
    /// key is missing.
    pub fn get_or_insert_with<F, V>(&mut self, key: &str, f: F) -> Result<&Value>
    where
        F: FnOnce() -> V,
        V: Into<Value>,
    {
        if !self.contains(key) {
            self.set(key, f())?;
        }
        self.get(key)
    }

    // ---- persistence ----

    /// Write the current contents to disk (temp file + rename), whether or
    /// not anything changed.
    pub fn flush(&mut self) -> Result<()> {
        self.sync.flush(&self.document)
    }

    /// Replace the in-memory contents with what's on disk, discarding any
    /// unsynced changes.
    pub fn reload(&mut self) -> Result<()> {
        let document = document::parse(&persist::load(self.sync.path())?)?;
        self.index = build_index(&document);
        self.document = document;
        self.sync.mark_clean();
        tracing::debug!(
            "Reloaded {} entries from {}",
            self.document.len(),
            self.path().display()
        );
        Ok(())
    }

    /// Write pending changes and release the store. Unlike drop, this reports
    /// a failed final sync.
    pub fn close(mut self) -> Result<()> {
        let result = self.sync.finish(&self.document);
        // Don't let drop retry a write the caller already saw fail.
        self.sync.mark_clean();
        tracing::debug!("Closed {}", self.path().display());
        result
    }

    // ---- internal ----

    fn put(&mut self, key: String, value: Value) -> Option<Value> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(self.document.value_at_mut(i), value)),
            None => {
                self.index.insert(key.clone(), self.document.len());
                self.document.push(Entry { key, value });
                None
            }
        }
    }
}

impl Drop for Datalink {
    fn drop(&mut self) {
        if let Err(e) = self.sync.finish(&self.document) {
            tracing::warn!("Final sync of {} failed: {}", self.path().display(), e);
        }
    }
}

impl std::fmt::Debug for Datalink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datalink")
            .field("path", &self.path())
            .field("policy", &self.sync.policy())
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

fn build_index(document: &Document) -> HashMap<String, usize> {
    document
        .iter()
        .enumerate()
        .map(|(i, e)| (e.key.clone(), i))
        .collect()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens a [`Datalink`] store.
///
/// ```rust,no_run
/// use datalink::Datalink;
///
/// let db = Datalink::builder("db.xml")
///     .auto_sync(false)
///     .pretty(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DatalinkBuilder {
    path: PathBuf,
    auto_sync: bool,
    auto_reload: bool,
    pretty: bool,
}

impl DatalinkBuilder {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            auto_sync: true,
            auto_reload: true,
            pretty: true,
        }
    }

    /// Write after every mutation (default: `true`). When off, writes happen
    /// on `flush()`, `close()` and drop.
    pub fn auto_sync(mut self, yes: bool) -> Self {
        self.auto_sync = yes;
        self
    }

    /// Load the existing file on open (default: `true`). When off the store
    /// starts empty and the first sync overwrites whatever was on disk.
    pub fn auto_reload(mut self, yes: bool) -> Self {
        self.auto_reload = yes;
        self
    }

    /// Indent the XML (default: `true`). Compact output puts the whole
    /// document on one line.
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Load (or create) the store.
    pub fn build(self) -> Result<Datalink> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("store path is empty".into()));
        }
        if self.path.is_dir() {
            return Err(Error::Config(format!(
                "{} is a directory",
                self.path.display()
            )));
        }

        let document = if self.auto_reload {
            document::parse(&persist::load(&self.path)?)?
        } else {
            Document::new()
        };
        tracing::debug!(
            "Opened {} with {} entries (auto_sync: {})",
            self.path.display(),
            document.len(),
            self.auto_sync
        );

        Ok(Datalink {
            index: build_index(&document),
            document,
            sync: SyncController::new(
                self.path,
                SyncPolicy::from_auto_sync(self.auto_sync),
                self.pretty,
            ),
        })
    }
}
