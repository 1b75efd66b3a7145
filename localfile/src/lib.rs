pub mod controller;
pub mod data_sources;
pub mod error;
pub mod hasher;
pub mod model;
pub mod provider_data;
pub mod resources;
pub mod source;

use async_trait::async_trait;
use plugkit::context::Context;
use plugkit::data_source::DataSourceWithConfigure;
use plugkit::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ResourceFactory,
};
use plugkit::resource::ResourceWithConfigure;
use plugkit::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use plugkit::types::{AttributePath, Diagnostic};
use provider_data::LocalFileProviderData;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub const BASE_DIR_ENV: &str = "LOCALFILE_BASE_DIR";

pub struct LocalFileProvider {
    provider_data: Option<LocalFileProviderData>,
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFileProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn provider_data(&self) -> Option<&LocalFileProviderData> {
        self.provider_data.as_ref()
    }
}

#[async_trait]
impl Provider for LocalFileProvider {
    fn type_name(&self) -> &str {
        "localfile"
    }

    async fn schema(&self, _ctx: Context) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages files on the local filesystem")
            .attribute(
                AttributeBuilder::new("base_dir", AttributeType::String)
                    .description(
                        "Directory relative filenames resolve against (or LOCALFILE_BASE_DIR env var)",
                    )
                    .optional()
                    .build(),
            )
            .build()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let base_dir = request
            .config
            .get_string(&AttributePath::new("base_dir"))
            .ok()
            .or_else(|| std::env::var(BASE_DIR_ENV).ok())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        if let Some(dir) = &base_dir {
            if !dir.is_dir() {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid base_dir",
                        format!("{} is not a directory", dir.display()),
                    )
                    .with_attribute(AttributePath::new("base_dir")),
                );
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        }

        tracing::info!(base_dir = ?base_dir, "configured localfile provider");

        let provider_data = LocalFileProviderData::new(base_dir);
        self.provider_data = Some(provider_data.clone());

        ConfigureProviderResponse {
            diagnostics,
            provider_data: Some(Arc::new(provider_data)),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources = HashMap::new();
        resources.insert(
            resources::file::TYPE_NAME.to_string(),
            (|| Box::new(resources::LocalFileResource::new()) as Box<dyn ResourceWithConfigure>)
                as ResourceFactory,
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources = HashMap::new();
        data_sources.insert(
            data_sources::file::TYPE_NAME.to_string(),
            (|| {
                Box::new(data_sources::LocalFileDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }) as DataSourceFactory,
        );
        data_sources
    }
}
