//! Errors raised by the file controller and data source

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid file specification: {0}")]
    InvalidSpec(String),

    #[error("content written to {} reads back as {actual}, expected {expected}", .path.display())]
    VerificationFailed {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl FileError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        FileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short summary suitable for a diagnostic headline
    pub fn summary(&self) -> &'static str {
        match self {
            FileError::Io { .. } => "File operation failed",
            FileError::NotFound(_) => "File not found",
            FileError::InvalidSpec(_) => "Invalid file configuration",
            FileError::VerificationFailed { .. } => "File content verification failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, FileError>;
