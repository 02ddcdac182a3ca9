//! Sync policy and the controller that decides when the document hits disk.

use crate::document::{self, Document};
use crate::error::Result;
use crate::persist::atomic_write;
use std::path::{Path, PathBuf};

/// Controls when mutations get written to disk.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Write after every mutation. Safest, but most I/O.
    Immediate,
    /// Mark the document dirty and only write on `flush()`, `close()` or drop.
    Deferred,
}

impl SyncPolicy {
    /// `Immediate` when `auto_sync` is set, `Deferred` otherwise.
    pub fn from_auto_sync(auto_sync: bool) -> Self {
        if auto_sync {
            SyncPolicy::Immediate
        } else {
            SyncPolicy::Deferred
        }
    }
}

/// Tracks whether the in-memory document has unsynced changes and writes it
/// out (render, temp file, rename) when asked to.
///
/// A failed write leaves the controller dirty, so the next flush retries with
/// whatever the document holds by then. Memory is never rolled back.
#[derive(Debug)]
pub struct SyncController {
    path: PathBuf,
    policy: SyncPolicy,
    pretty: bool,
    dirty: bool,
}

impl SyncController {
    /// Controller for the file at `path`. Starts clean.
    pub fn new(path: impl Into<PathBuf>, policy: SyncPolicy, pretty: bool) -> Self {
        Self {
            path: path.into(),
            policy,
            pretty,
            dirty: false,
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured policy.
    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// `true` if there are changes the file doesn't have yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record a change to `document`. With `immediate` the document is
    /// written right away; otherwise the write waits for the next flush.
    pub fn request_sync(&mut self, document: &Document, immediate: bool) -> Result<()> {
        self.dirty = true;
        if immediate {
            self.persist(document)
        } else {
            Ok(())
        }
    }

    /// Record a change according to the configured policy.
    pub fn on_mutation(&mut self, document: &Document) -> Result<()> {
        self.request_sync(document, self.policy == SyncPolicy::Immediate)
    }

    /// Write `document` now, dirty or not.
    pub fn flush(&mut self, document: &Document) -> Result<()> {
        self.persist(document)
    }

    /// Write `document` only if something changed since the last write.
    pub fn finish(&mut self, document: &Document) -> Result<()> {
        if self.dirty {
            self.persist(document)
        } else {
            Ok(())
        }
    }

    /// Forget pending changes, e.g. after the document was reloaded from disk.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn persist(&mut self, document: &Document) -> Result<()> {
        let text = document::render(document, self.pretty)?;
        atomic_write(&self.path, text.as_bytes())?;
        self.dirty = false;
        tracing::trace!(
            "Synced {} entries to {}",
            document.len(),
            self.path.display()
        );
        Ok(())
    }
}
