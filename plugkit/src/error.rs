//! Error types for plugkit

/// Error type for plugkit operations
#[derive(Debug, thiserror::Error)]
pub enum PlugError {
    #[error("Resource type not found: {0}")]
    ResourceNotFound(String),

    #[error("Data source type not found: {0}")]
    DataSourceNotFound(String),

    #[error("Provider not configured")]
    ProviderNotConfigured,

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

/// Result type alias for plugkit operations
pub type Result<T> = std::result::Result<T, PlugError>;

impl From<String> for PlugError {
    fn from(s: String) -> Self {
        PlugError::Custom(s)
    }
}

impl From<&str> for PlugError {
    fn from(s: &str) -> Self {
        PlugError::Custom(s.to_string())
    }
}
