//! local_file data source
//!
//! Reads an existing file through the provider's base directory. A missing
//! file is an error diagnostic; nothing is ever written.

use crate::provider_data::LocalFileProviderData;
use crate::resources::file::file_error_diagnostic;
use crate::source::FileDataSource;
use async_trait::async_trait;
use plugkit::context::Context;
use plugkit::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceWithConfigure,
    ReadDataSourceRequest, ReadDataSourceResponse,
};
use plugkit::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use plugkit::types::{AttributePath, Diagnostic, DynamicValue};

pub const TYPE_NAME: &str = "local_file";

#[derive(Default)]
pub struct LocalFileDataSource {
    provider_data: Option<LocalFileProviderData>,
    source: FileDataSource,
}

impl LocalFileDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Reads a file from the local filesystem")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("SHA1 hash of the file content")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("filename", AttributeType::String)
                    .description("Path to the file that will be read")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("content", AttributeType::String)
                    .description("Raw content of the file that was read")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("hash", AttributeType::String)
                    .description("SHA1 hash of the file")
                    .computed()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl DataSource for LocalFileDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(&self, _ctx: Context) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let filename = match request
            .config
            .get_string(&AttributePath::new("filename"))
        {
            Ok(filename) => filename,
            Err(_) => {
                diagnostics.push(
                    Diagnostic::error("Missing filename", "The 'filename' attribute is required")
                        .with_attribute(AttributePath::new("filename")),
                );
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let loaded = match self.source.load(&provider_data.resolve(&filename)) {
            Ok(loaded) => loaded,
            Err(e) => {
                diagnostics.push(file_error_diagnostic(&e));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let mut state = DynamicValue::object();
        let _ = state.set_string(&AttributePath::new("id"), loaded.identifier);
        let _ = state.set_string(&AttributePath::new("filename"), filename);
        let _ = state.set_string(&AttributePath::new("content"), loaded.content);
        let _ = state.set_string(&AttributePath::new("hash"), loaded.hash);

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for LocalFileDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<LocalFileProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract LocalFileProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the data source",
            ));
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
