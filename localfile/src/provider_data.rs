//! Provider data structure passed to resources and data sources

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct LocalFileProviderData {
    /// Relative filenames resolve against this directory when set
    pub base_dir: Option<PathBuf>,
}

impl LocalFileProviderData {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    pub fn resolve(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
