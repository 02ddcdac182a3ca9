//! Disk I/O helpers: load from file and atomic write.
//!
//! The rename-over approach is close to atomic on most platforms. On NTFS
//! (Windows) it's reliable; on FAT32 or network shares there are no hard
//! guarantees. If that matters to you, keep backups or use a real database.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reads the file at `path` as UTF-8 text. Returns an empty string if the file
/// is missing (not an error), so a fresh path bootstraps an empty store.
pub fn load(path: &Path) -> Result<String> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => {
            return Err(Error::Persistence(format!(
                "reading {}: {e}",
                path.display()
            )))
        }
    };
    String::from_utf8(bytes).map_err(|e| {
        Error::MalformedDocument(format!("{} is not valid UTF-8: {e}", path.display()))
    })
}

/// Sibling path the new contents are staged in before the rename:
/// `<path>.<ext>.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("xml");
    path.with_extension(format!("{ext}.tmp"))
}

/// Write `bytes` to [`temp_path`], fsync it and then rename over `path`. A
/// crash mid-write leaves the old file untouched; a failed write or rename
/// removes the staging file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    if let Err(e) = write_synced(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Persistence(format!("writing {}: {e}", tmp.display())));
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Persistence(format!(
            "renaming {} over {}: {e}",
            tmp.display(),
            path.display()
        )));
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
