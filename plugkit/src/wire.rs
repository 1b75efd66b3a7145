//! Host wire format
//!
//! One JSON object per line in each direction. Requests and responses are
//! tagged by `op`; every response carries its diagnostics.

use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostic, DynamicValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the line protocol announced in the ready message
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostRequest {
    GetSchema,
    ConfigureProvider {
        #[serde(default)]
        config: DynamicValue,
    },
    ValidateResourceConfig {
        type_name: String,
        config: DynamicValue,
    },
    PlanResourceChange {
        type_name: String,
        #[serde(default)]
        prior_state: DynamicValue,
        #[serde(default)]
        config: DynamicValue,
    },
    CreateResource {
        type_name: String,
        config: DynamicValue,
        #[serde(default)]
        planned_state: DynamicValue,
    },
    ReadResource {
        type_name: String,
        current_state: DynamicValue,
    },
    UpdateResource {
        type_name: String,
        prior_state: DynamicValue,
        config: DynamicValue,
        #[serde(default)]
        planned_state: DynamicValue,
    },
    DeleteResource {
        type_name: String,
        prior_state: DynamicValue,
    },
    ImportResourceState {
        type_name: String,
        id: String,
    },
    ValidateDataSourceConfig {
        type_name: String,
        config: DynamicValue,
    },
    ReadDataSource {
        type_name: String,
        config: DynamicValue,
    },
    Stop,
}

impl HostRequest {
    pub fn op_name(&self) -> &'static str {
        match self {
            HostRequest::GetSchema => "get_schema",
            HostRequest::ConfigureProvider { .. } => "configure_provider",
            HostRequest::ValidateResourceConfig { .. } => "validate_resource_config",
            HostRequest::PlanResourceChange { .. } => "plan_resource_change",
            HostRequest::CreateResource { .. } => "create_resource",
            HostRequest::ReadResource { .. } => "read_resource",
            HostRequest::UpdateResource { .. } => "update_resource",
            HostRequest::DeleteResource { .. } => "delete_resource",
            HostRequest::ImportResourceState { .. } => "import_resource_state",
            HostRequest::ValidateDataSourceConfig { .. } => "validate_data_source_config",
            HostRequest::ReadDataSource { .. } => "read_data_source",
            HostRequest::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostResponse {
    Ready {
        protocol_version: u32,
        provider: String,
    },
    GetSchema {
        provider: Schema,
        resource_schemas: BTreeMap<String, Schema>,
        data_source_schemas: BTreeMap<String, Schema>,
        diagnostics: Vec<Diagnostic>,
    },
    ConfigureProvider {
        diagnostics: Vec<Diagnostic>,
    },
    ValidateResourceConfig {
        diagnostics: Vec<Diagnostic>,
    },
    PlanResourceChange {
        planned_state: DynamicValue,
        requires_replace: Vec<AttributePath>,
        diagnostics: Vec<Diagnostic>,
    },
    CreateResource {
        new_state: DynamicValue,
        diagnostics: Vec<Diagnostic>,
    },
    ReadResource {
        /// null when the object no longer exists
        new_state: Option<DynamicValue>,
        diagnostics: Vec<Diagnostic>,
    },
    UpdateResource {
        new_state: DynamicValue,
        diagnostics: Vec<Diagnostic>,
    },
    DeleteResource {
        diagnostics: Vec<Diagnostic>,
    },
    ImportResourceState {
        imported: Vec<DynamicValue>,
        diagnostics: Vec<Diagnostic>,
    },
    ValidateDataSourceConfig {
        diagnostics: Vec<Diagnostic>,
    },
    ReadDataSource {
        state: DynamicValue,
        diagnostics: Vec<Diagnostic>,
    },
    Stop,
    /// Reply to a line that could not be decoded
    Error {
        diagnostics: Vec<Diagnostic>,
    },
}

impl HostResponse {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            HostResponse::GetSchema { diagnostics, .. }
            | HostResponse::ConfigureProvider { diagnostics }
            | HostResponse::ValidateResourceConfig { diagnostics }
            | HostResponse::PlanResourceChange { diagnostics, .. }
            | HostResponse::CreateResource { diagnostics, .. }
            | HostResponse::ReadResource { diagnostics, .. }
            | HostResponse::UpdateResource { diagnostics, .. }
            | HostResponse::DeleteResource { diagnostics }
            | HostResponse::ImportResourceState { diagnostics, .. }
            | HostResponse::ValidateDataSourceConfig { diagnostics }
            | HostResponse::ReadDataSource { diagnostics, .. }
            | HostResponse::Error { diagnostics } => diagnostics.as_slice(),
            HostResponse::Ready { .. } | HostResponse::Stop => &[],
        }
    }
}
