// crates/dockgate-core/src/runtime/file_store.rs
// ============================================================================
// Module: Dockgate File Permission Backend
// Description: Filesystem persistence for the permission document.
// Purpose: Store the document as a single file replaced atomically.
// Dependencies: crate::interfaces, std
// ============================================================================

//! ## Overview
//! [`FilePermissionBackend`] reads the document from one path and replaces it
//! by writing a sibling temporary file, syncing it, and renaming it over the
//! original. Readers therefore observe either the old or the new document,
//! never a torn one. Separate processes writing the same path race; the last
//! rename wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::interfaces::PermissionBackend;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum permission document size accepted on read (bytes).
pub const MAX_PERMISSION_DOCUMENT_BYTES: u64 = 1024 * 1024;

/// Counter used to build unique temporary file names.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// SECTION: File Backend
// ============================================================================

/// Permission document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FilePermissionBackend {
    /// Document path.
    path: PathBuf,
}

impl FilePermissionBackend {
    /// Creates a backend for `path`; the file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a fresh temporary path next to the document.
    fn temp_path(&self) -> Result<PathBuf, StoreError> {
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::Io("permission path has no file name".to_string()))?;
        let attempt = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_name = format!(".{file_name}.tmp.{}.{attempt}", std::process::id());
        Ok(self.path.with_file_name(temp_name))
    }
}

impl PermissionBackend for FilePermissionBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };
        if metadata.len() > MAX_PERMISSION_DOCUMENT_BYTES {
            return Err(StoreError::Store(format!(
                "permission document exceeds {MAX_PERMISSION_DOCUMENT_BYTES} bytes"
            )));
        }
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err.to_string())),
        }
    }

    fn write(&self, document: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
        }
        let temp_path = self.temp_path()?;
        let result = write_and_sync(&temp_path, document)
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(err) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Io(err.to_string()));
        }
        Ok(())
    }
}

/// Writes `bytes` to a new file at `path` and flushes it to disk.
fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
