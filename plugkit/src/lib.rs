//! plugkit - provider-side lifecycle framework
//!
//! Providers expose resources (create/read/update/delete) and data sources
//! (read) to a host that persists state between calls. The host talks to the
//! provider through `serve`, one JSON request per line.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod plan;
pub mod plan_modifier;
pub mod validator;

// Host boundary
pub mod server;
pub mod wire;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{PlugError, Result};
pub use provider::Provider;
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use server::{serve, ProviderServer};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
