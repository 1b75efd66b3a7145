//! Resource implementations

pub mod file;

pub use file::LocalFileResource;
