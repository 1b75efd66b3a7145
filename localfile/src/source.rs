//! Read-only access to an existing file
//!
//! Unlike the resource controller, a missing file is an error here: there is
//! nothing to fall back to.

use crate::controller::is_absent;
use crate::error::{FileError, Result};
use crate::model::FileState;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileDataSource;

impl FileDataSource {
    pub fn new() -> Self {
        Self
    }

    /// Load content and digest; never writes
    pub fn load(&self, filename: &Path) -> Result<FileState> {
        if is_absent(filename) {
            return Err(FileError::NotFound(filename.to_path_buf()));
        }

        let bytes = fs::read(filename).map_err(|e| FileError::io(filename, e))?;
        let state = FileState::observed(filename, &bytes);

        tracing::debug!(
            filename = %filename.display(),
            id = %state.identifier,
            bytes = bytes.len(),
            "loaded file"
        );
        Ok(state)
    }
}
