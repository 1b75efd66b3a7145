//! Schema-driven configuration validation
//!
//! Every check reports a diagnostic anchored to the offending attribute so the
//! host can point at the right line of configuration.

use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Validate a configuration object against a schema
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let Some(values) = config.attributes() else {
        if config.is_unknown() {
            return diagnostics;
        }
        diagnostics.push(Diagnostic::error(
            "Invalid configuration",
            format!(
                "Configuration must be an object, got {}",
                config.value.type_name()
            ),
        ));
        return diagnostics;
    };

    for attr in &schema.attributes {
        let value = values.get(&attr.name);
        let is_set = value.is_some_and(|v| !v.is_null());

        if attr.required && !is_set {
            diagnostics.push(
                Diagnostic::error(
                    format!("Missing required attribute: {}", attr.name),
                    format!(
                        "The attribute '{}' is required but was not provided",
                        attr.name
                    ),
                )
                .with_attribute(AttributePath::new(&attr.name)),
            );
        }

        if attr.is_computed_only() && is_set && !value.is_some_and(|v| v.is_unknown()) {
            diagnostics.push(
                Diagnostic::error(
                    format!("Cannot set computed attribute: {}", attr.name),
                    format!(
                        "The attribute '{}' is computed by the provider and cannot be configured",
                        attr.name
                    ),
                )
                .with_attribute(AttributePath::new(&attr.name)),
            );
        }
    }

    let mut names: Vec<&String> = values.keys().collect();
    names.sort();

    for name in names {
        let value = &values[name];
        match schema.attribute(name) {
            Some(attr) if !attr.r#type.accepts(value) => {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Type mismatch for attribute: {}", name),
                        format!(
                            "Attribute '{}' expects type {:?} but got {}",
                            name,
                            attr.r#type,
                            value.type_name()
                        ),
                    )
                    .with_attribute(AttributePath::new(name)),
                );
            }
            Some(_) => {}
            None => {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Unknown attribute: {}", name),
                        format!("The attribute '{}' is not defined in the schema", name),
                    )
                    .with_attribute(AttributePath::new(name)),
                );
            }
        }
    }

    diagnostics
}
