//! Server module for running providers
//!
//! The server owns the provider, instantiates resources and data sources per
//! request through the provider's factories, and speaks the line protocol from
//! `wire` over any async reader/writer pair (stdin/stdout in `serve`).

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceWithConfigure, ReadDataSourceRequest,
    ValidateDataSourceConfigRequest,
};
use crate::error::{PlugError, Result};
use crate::plan::plan_resource_change;
use crate::provider::{ConfigureProviderRequest, Provider};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, ResourceWithConfigure,
    UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::types::{has_errors, Diagnostic, DynamicValue};
use crate::validator::validate_config;
use crate::wire::{HostRequest, HostResponse, PROTOCOL_VERSION};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

pub struct ProviderServer<P: Provider> {
    provider: P,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    configured: bool,
    next_request_id: u64,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            provider_data: None,
            configured: false,
            next_request_id: 0,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Read requests until EOF or a stop request, answering each on `writer`
    pub async fn run<R, W>(mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let ready = HostResponse::Ready {
            protocol_version: PROTOCOL_VERSION,
            provider: self.provider.type_name().to_string(),
        };
        write_response(&mut writer, &ready).await?;
        tracing::info!(provider = self.provider.type_name(), "provider server ready");

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line).await;
            write_response(&mut writer, &response).await?;

            if matches!(response, HostResponse::Stop) {
                tracing::info!("stop requested, shutting down");
                break;
            }
        }

        Ok(())
    }

    pub async fn handle_line(&mut self, line: &str) -> HostResponse {
        match serde_json::from_str::<HostRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::warn!("rejecting malformed request: {}", e);
                HostResponse::Error {
                    diagnostics: vec![Diagnostic::error(
                        "Malformed request",
                        format!("Could not decode request: {}", e),
                    )],
                }
            }
        }
    }

    pub async fn handle(&mut self, request: HostRequest) -> HostResponse {
        self.next_request_id += 1;
        let ctx = Context::for_request(self.next_request_id, request.op_name());
        let span = ctx.span().clone();

        let response = self.dispatch(ctx.clone(), request).instrument(span).await;

        tracing::debug!(
            request_id = ctx.request_id(),
            op = ctx.operation(),
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            errors = has_errors(response.diagnostics()),
            "request handled"
        );
        response
    }

    async fn dispatch(&mut self, ctx: Context, request: HostRequest) -> HostResponse {
        match request {
            HostRequest::GetSchema => self.get_schema(ctx).await,

            HostRequest::ConfigureProvider { config } => {
                // An omitted provider block is an empty one
                let config = if config.is_null() {
                    DynamicValue::object()
                } else {
                    config
                };
                let schema = self.provider.schema(ctx.clone()).await;
                let diagnostics = validate_config(&schema, &config);
                if has_errors(&diagnostics) {
                    return HostResponse::ConfigureProvider { diagnostics };
                }

                let response = self
                    .provider
                    .configure(ctx, ConfigureProviderRequest { config })
                    .await;
                self.configured = !has_errors(&response.diagnostics);
                self.provider_data = response.provider_data;

                HostResponse::ConfigureProvider {
                    diagnostics: response.diagnostics,
                }
            }

            HostRequest::ValidateResourceConfig { type_name, config } => {
                let diagnostics = match self.new_resource(&type_name) {
                    Ok(resource) => {
                        resource
                            .validate(ctx, ValidateResourceConfigRequest { type_name, config })
                            .await
                            .diagnostics
                    }
                    Err(diagnostics) => diagnostics,
                };
                HostResponse::ValidateResourceConfig { diagnostics }
            }

            HostRequest::PlanResourceChange {
                type_name,
                prior_state,
                config,
            } => match self.new_resource(&type_name) {
                Ok(resource) => {
                    let schema = resource.schema(ctx).await;
                    let plan = plan_resource_change(&schema, &prior_state, &config);
                    HostResponse::PlanResourceChange {
                        planned_state: plan.planned_state,
                        requires_replace: plan.requires_replace,
                        diagnostics: plan.diagnostics,
                    }
                }
                Err(diagnostics) => HostResponse::PlanResourceChange {
                    planned_state: prior_state,
                    requires_replace: Vec::new(),
                    diagnostics,
                },
            },

            HostRequest::CreateResource {
                type_name,
                config,
                planned_state,
            } => {
                let resource = match self.configured_resource(&ctx, &type_name).await {
                    Ok(resource) => resource,
                    Err(diagnostics) => {
                        return HostResponse::CreateResource {
                            new_state: DynamicValue::null(),
                            diagnostics,
                        }
                    }
                };
                let response = resource
                    .create(
                        ctx,
                        CreateResourceRequest {
                            type_name,
                            planned_state,
                            config,
                        },
                    )
                    .await;
                HostResponse::CreateResource {
                    new_state: response.new_state,
                    diagnostics: response.diagnostics,
                }
            }

            HostRequest::ReadResource {
                type_name,
                current_state,
            } => {
                let resource = match self.configured_resource(&ctx, &type_name).await {
                    Ok(resource) => resource,
                    Err(diagnostics) => {
                        return HostResponse::ReadResource {
                            new_state: Some(current_state),
                            diagnostics,
                        }
                    }
                };
                let response = resource
                    .read(
                        ctx,
                        ReadResourceRequest {
                            type_name,
                            current_state,
                        },
                    )
                    .await;
                HostResponse::ReadResource {
                    new_state: response.new_state,
                    diagnostics: response.diagnostics,
                }
            }

            HostRequest::UpdateResource {
                type_name,
                prior_state,
                config,
                planned_state,
            } => {
                let resource = match self.configured_resource(&ctx, &type_name).await {
                    Ok(resource) => resource,
                    Err(diagnostics) => {
                        return HostResponse::UpdateResource {
                            new_state: prior_state,
                            diagnostics,
                        }
                    }
                };
                let response = resource
                    .update(
                        ctx,
                        UpdateResourceRequest {
                            type_name,
                            prior_state,
                            planned_state,
                            config,
                        },
                    )
                    .await;
                HostResponse::UpdateResource {
                    new_state: response.new_state,
                    diagnostics: response.diagnostics,
                }
            }

            HostRequest::DeleteResource {
                type_name,
                prior_state,
            } => {
                let diagnostics = match self.configured_resource(&ctx, &type_name).await {
                    Ok(resource) => {
                        resource
                            .delete(
                                ctx,
                                DeleteResourceRequest {
                                    type_name,
                                    prior_state,
                                },
                            )
                            .await
                            .diagnostics
                    }
                    Err(diagnostics) => diagnostics,
                };
                HostResponse::DeleteResource { diagnostics }
            }

            HostRequest::ImportResourceState { type_name, id } => {
                match self.configured_resource(&ctx, &type_name).await {
                    Ok(resource) => {
                        let response = resource
                            .import_state(ctx, ImportResourceStateRequest { type_name, id })
                            .await;
                        HostResponse::ImportResourceState {
                            imported: response.imported,
                            diagnostics: response.diagnostics,
                        }
                    }
                    Err(diagnostics) => HostResponse::ImportResourceState {
                        imported: Vec::new(),
                        diagnostics,
                    },
                }
            }

            HostRequest::ValidateDataSourceConfig { type_name, config } => {
                let diagnostics = match self.new_data_source(&type_name) {
                    Ok(data_source) => {
                        data_source
                            .validate(ctx, ValidateDataSourceConfigRequest { type_name, config })
                            .await
                            .diagnostics
                    }
                    Err(diagnostics) => diagnostics,
                };
                HostResponse::ValidateDataSourceConfig { diagnostics }
            }

            HostRequest::ReadDataSource { type_name, config } => {
                match self.configured_data_source(&ctx, &type_name).await {
                    Ok(data_source) => {
                        let response = data_source
                            .read(ctx, ReadDataSourceRequest { type_name, config })
                            .await;
                        HostResponse::ReadDataSource {
                            state: response.state,
                            diagnostics: response.diagnostics,
                        }
                    }
                    Err(diagnostics) => HostResponse::ReadDataSource {
                        state: DynamicValue::null(),
                        diagnostics,
                    },
                }
            }

            HostRequest::Stop => HostResponse::Stop,
        }
    }

    async fn get_schema(&self, ctx: Context) -> HostResponse {
        let mut resource_schemas = BTreeMap::new();
        for (name, factory) in self.provider.resources() {
            let schema = factory().schema(ctx.clone()).await;
            resource_schemas.insert(name, schema);
        }

        let mut data_source_schemas = BTreeMap::new();
        for (name, factory) in self.provider.data_sources() {
            let schema = factory().schema(ctx.clone()).await;
            data_source_schemas.insert(name, schema);
        }

        HostResponse::GetSchema {
            provider: self.provider.schema(ctx).await,
            resource_schemas,
            data_source_schemas,
            diagnostics: Vec::new(),
        }
    }

    fn new_resource(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        self.provider
            .resources()
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                error_diagnostics(
                    "Unknown resource type",
                    PlugError::ResourceNotFound(type_name.to_string()),
                )
            })
    }

    async fn configured_resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> std::result::Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        if !self.configured {
            return Err(error_diagnostics(
                "Provider not configured",
                PlugError::ProviderNotConfigured,
            ));
        }

        let mut resource = self.new_resource(type_name)?;
        let response = resource
            .configure(
                ctx.clone(),
                ConfigureResourceRequest {
                    provider_data: self.provider_data.clone(),
                },
            )
            .await;

        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    fn new_data_source(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        self.provider
            .data_sources()
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                error_diagnostics(
                    "Unknown data source type",
                    PlugError::DataSourceNotFound(type_name.to_string()),
                )
            })
    }

    async fn configured_data_source(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> std::result::Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        if !self.configured {
            return Err(error_diagnostics(
                "Provider not configured",
                PlugError::ProviderNotConfigured,
            ));
        }

        let mut data_source = self.new_data_source(type_name)?;
        let response = data_source
            .configure(
                ctx.clone(),
                ConfigureDataSourceRequest {
                    provider_data: self.provider_data.clone(),
                },
            )
            .await;

        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }
}

fn error_diagnostics(summary: &str, err: PlugError) -> Vec<Diagnostic> {
    vec![Diagnostic::error(summary, err.to_string())]
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &HostResponse) -> Result<()> {
    let mut encoded = serde_json::to_vec(response)
        .map_err(|e| PlugError::EncodingError(format!("response encoding failed: {}", e)))?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

/// Main entry point for running a provider over stdin/stdout
/// Logging must go to stderr; stdout carries the protocol
pub async fn serve<P: Provider + 'static>(provider: P) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    ProviderServer::new(provider).run(stdin, stdout).await
}
