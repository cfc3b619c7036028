//! Whole-file replacement for the JSON and coordinate files the crate writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `bytes` to a temporary sibling of `path`, then rename it into place.
///
/// Missing parent directories are created. If any step fails the temporary
/// file is removed and `path` keeps its previous contents.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        // Nothing to do if the temporary file was never created
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

// =============================================================================
// Tests
// =============================================================================
