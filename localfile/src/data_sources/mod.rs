//! Data source implementations

pub mod file;

pub use file::LocalFileDataSource;
