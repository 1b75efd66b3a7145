//! Desired and observed file state

use crate::error::{FileError, Result};
use crate::hasher::digest;
use std::path::{Path, PathBuf};

/// Desired state of a managed file
///
/// `filename` is fixed for the lifetime of a resource; a different filename
/// is a different resource. `content` may change between applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    filename: PathBuf,
    content: String,
}

impl FileSpec {
    pub fn new(filename: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self> {
        let filename = filename.into();
        let raw = filename.as_os_str();

        if raw.is_empty() {
            return Err(FileError::InvalidSpec("filename must not be empty".into()));
        }
        if raw.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR) || raw == "." {
            return Err(FileError::InvalidSpec(format!(
                "filename {} names a directory, not a file",
                filename.display()
            )));
        }

        Ok(Self {
            filename,
            content: content.into(),
        })
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Observed state of a managed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    pub filename: PathBuf,
    /// Digest of the bytes last observed on disk; doubles as the resource id
    pub identifier: String,
    pub hash: String,
    pub content: String,
}

impl FileState {
    /// State describing `bytes` found (or just written) at `filename`
    pub fn observed(filename: &Path, bytes: &[u8]) -> Self {
        let checksum = digest(bytes);
        let content = match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                tracing::warn!(
                    filename = %filename.display(),
                    "file is not valid UTF-8, content attribute is a lossy rendering"
                );
                String::from_utf8_lossy(bytes).into_owned()
            }
        };

        Self {
            filename: filename.to_path_buf(),
            identifier: checksum.clone(),
            hash: checksum,
            content,
        }
    }
}

/// Result of reconciling recorded state with the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The file is gone; the caller drops its stored state
    Absent,
    /// On-disk bytes match the recorded identifier
    Unchanged(FileState),
    /// On-disk bytes changed outside of management; state reflects the disk
    Drifted(FileState),
    /// The file was rewritten with new desired content
    Written(FileState),
}

impl Observation {
    pub fn state(&self) -> Option<&FileState> {
        match self {
            Observation::Absent => None,
            Observation::Unchanged(state)
            | Observation::Drifted(state)
            | Observation::Written(state) => Some(state),
        }
    }

    pub fn into_state(self) -> Option<FileState> {
        match self {
            Observation::Absent => None,
            Observation::Unchanged(state)
            | Observation::Drifted(state)
            | Observation::Written(state) => Some(state),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Observation::Absent)
    }
}
