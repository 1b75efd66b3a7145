//! local_file resource
//!
//! Translates between framework requests and the file controller. State
//! carries `id`, `filename`, `content` and `hash`; `id` and `hash` are the
//! same digest.

use crate::controller::FileResourceController;
use crate::error::FileError;
use crate::model::{FileSpec, FileState, Observation};
use crate::provider_data::LocalFileProviderData;
use crate::source::FileDataSource;
use async_trait::async_trait;
use plugkit::context::Context;
use plugkit::plan_modifier::RequiresReplaceIfChanged;
use plugkit::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse,
};
use plugkit::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use plugkit::types::{AttributePath, Diagnostic, DynamicValue};

pub const TYPE_NAME: &str = "local_file";

#[derive(Default)]
pub struct LocalFileResource {
    provider_data: Option<LocalFileProviderData>,
    controller: FileResourceController,
}

impl LocalFileResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Creates a text file and writes it to a local folder")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("SHA1 hash of the file content, used as the resource id")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("filename", AttributeType::String)
                    .description("The path to the file that will be created")
                    .required()
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("content", AttributeType::String)
                    .description("Content of the file")
                    .required()
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

    fn provider_data(&self) -> Result<&LocalFileProviderData, Diagnostic> {
        self.provider_data.as_ref().ok_or_else(|| {
            Diagnostic::error(
                "Provider not configured",
                "Provider data was not properly configured",
            )
        })
    }

    /// Desired file from config, plus the filename exactly as configured
    fn desired(&self, config: &DynamicValue) -> Result<(String, FileSpec), Diagnostic> {
        let provider_data = self.provider_data()?;

        let filename = config
            .get_string(&AttributePath::new("filename"))
            .map_err(|_| {
                Diagnostic::error("Missing filename", "The 'filename' attribute is required")
                    .with_attribute(AttributePath::new("filename"))
            })?;
        let content = config
            .get_string(&AttributePath::new("content"))
            .map_err(|_| {
                Diagnostic::error("Missing content", "The 'content' attribute is required")
                    .with_attribute(AttributePath::new("content"))
            })?;

        let spec = FileSpec::new(provider_data.resolve(&filename), content)
            .map_err(|e| file_error_diagnostic(&e))?;
        Ok((filename, spec))
    }

    /// Recorded state, or None when the resource was never created
    fn recorded(&self, state: &DynamicValue) -> Result<Option<(String, FileState)>, Diagnostic> {
        if state.is_null() {
            return Ok(None);
        }

        let Ok(identifier) = state.get_string(&AttributePath::new("id")) else {
            return Ok(None);
        };
        if identifier.is_empty() {
            return Ok(None);
        }

        let filename = state
            .get_string(&AttributePath::new("filename"))
            .map_err(|_| {
                Diagnostic::error(
                    "Corrupt state",
                    "The stored state has an id but no 'filename' attribute",
                )
            })?;
        let provider_data = self.provider_data()?;

        let hash = state
            .get_string(&AttributePath::new("hash"))
            .unwrap_or_else(|_| identifier.clone());
        let content = state
            .get_string(&AttributePath::new("content"))
            .unwrap_or_default();

        Ok(Some((
            filename.clone(),
            FileState {
                filename: provider_data.resolve(&filename),
                identifier,
                hash,
                content,
            },
        )))
    }
}

/// State value as stored by the host; `filename` keeps its configured form
fn state_value(filename: &str, state: &FileState) -> DynamicValue {
    let mut value = DynamicValue::object();
    let _ = value.set_string(&AttributePath::new("id"), state.identifier.clone());
    let _ = value.set_string(&AttributePath::new("filename"), filename);
    let _ = value.set_string(&AttributePath::new("content"), state.content.clone());
    let _ = value.set_string(&AttributePath::new("hash"), state.hash.clone());
    value
}

pub(crate) fn file_error_diagnostic(err: &FileError) -> Diagnostic {
    let diagnostic = Diagnostic::error(err.summary(), err.to_string());
    match err {
        FileError::InvalidSpec(_) | FileError::NotFound(_) => {
            diagnostic.with_attribute(AttributePath::new("filename"))
        }
        _ => diagnostic,
    }
}

#[async_trait]
impl Resource for LocalFileResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(&self, _ctx: Context) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let (filename, spec) = match self.desired(&request.config) {
            Ok(desired) => desired,
            Err(diag) => {
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics: vec![diag],
                }
            }
        };

        match self.controller.create(&spec) {
            Ok(state) => CreateResourceResponse {
                new_state: state_value(&filename, &state),
                diagnostics: vec![],
            },
            Err(e) => {
                tracing::error!("failed to create {}: {}", spec.filename().display(), e);
                CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics: vec![file_error_diagnostic(&e)],
                }
            }
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let (filename, prior) = match self.recorded(&request.current_state) {
            Ok(Some(recorded)) => recorded,
            Ok(None) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![],
                }
            }
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                }
            }
        };

        match self.controller.read(&prior.filename, &prior) {
            Ok(Observation::Absent) => ReadResourceResponse {
                new_state: None,
                diagnostics: vec![],
            },
            Ok(Observation::Unchanged(_)) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![],
            },
            Ok(Observation::Drifted(state)) | Ok(Observation::Written(state)) => {
                ReadResourceResponse {
                    new_state: Some(state_value(&filename, &state)),
                    diagnostics: vec![],
                }
            }
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![file_error_diagnostic(&e)],
            },
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let (filename, spec) = match self.desired(&request.config) {
            Ok(desired) => desired,
            Err(diag) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![diag],
                }
            }
        };

        let prior = match self.recorded(&request.prior_state) {
            Ok(Some((_, prior))) => prior,
            Ok(None) => {
                return UpdateResourceResponse {
                    new_state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Missing prior state",
                        "Update requires a previously created resource",
                    )],
                }
            }
            Err(diag) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![diag],
                }
            }
        };

        match self.controller.update(&spec, &prior) {
            Ok(Observation::Absent) => UpdateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::warning(
                    "File removed outside of management",
                    format!(
                        "{} no longer exists and will be recreated on the next apply",
                        spec.filename().display()
                    ),
                )
                .with_attribute(AttributePath::new("filename"))],
            },
            Ok(observation) => {
                let new_state = observation
                    .state()
                    .map(|state| state_value(&filename, state))
                    .unwrap_or_default();
                UpdateResourceResponse {
                    new_state,
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                tracing::error!("failed to update {}: {}", spec.filename().display(), e);
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![file_error_diagnostic(&e)],
                }
            }
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let filename = match request
            .prior_state
            .get_string(&AttributePath::new("filename"))
        {
            Ok(filename) => filename,
            Err(_) => {
                // Nothing recorded, nothing to remove
                return DeleteResourceResponse { diagnostics };
            }
        };

        let provider_data = match self.provider_data() {
            Ok(data) => data,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        let path = provider_data.resolve(&filename);
        if let Err(e) = self.controller.delete(&path) {
            // State is dropped regardless, so this is only a warning
            tracing::warn!("failed to remove {}: {}", path.display(), e);
            diagnostics.push(Diagnostic::warning(e.summary(), e.to_string()));
        }

        DeleteResourceResponse { diagnostics }
    }

    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let provider_data = match self.provider_data() {
            Ok(data) => data,
            Err(diag) => {
                return ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: vec![diag],
                }
            }
        };

        // The import id is the filename; the digest is derived from disk
        let path = provider_data.resolve(&request.id);
        match FileDataSource::new().load(&path) {
            Ok(state) => ImportResourceStateResponse {
                imported: vec![state_value(&request.id, &state)],
                diagnostics: vec![],
            },
            Err(e) => ImportResourceStateResponse {
                imported: vec![],
                diagnostics: vec![file_error_diagnostic(&e)],
            },
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for LocalFileResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
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
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}
