//! Resource change planning
//!
//! Planning combines prior state with the new configuration:
//! 1. Configured attributes take their config value
//! 2. Computed attributes become unknown unless nothing configurable changed
//! 3. Plan modifiers run per attribute in schema order

use crate::plan_modifier::PlanModifyRequest;
use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Outcome of planning a single resource
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PlannedChange {
    pub fn is_destroy(&self) -> bool {
        self.planned_state.is_null()
    }
}

pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    // A null config means the resource was removed from configuration
    if config.is_null() {
        return PlannedChange {
            planned_state: DynamicValue::null(),
            requires_replace: Vec::new(),
            diagnostics: Vec::new(),
        };
    }

    let lookup = |value: &DynamicValue, name: &str| {
        value
            .get(&AttributePath::new(name))
            .cloned()
            .unwrap_or(Dynamic::Null)
    };

    let creating = prior_state.is_null();
    let config_changed = !creating
        && schema
            .attributes
            .iter()
            .filter(|attr| !attr.is_computed_only())
            .any(|attr| lookup(prior_state, &attr.name) != lookup(config, &attr.name));

    let mut planned_state = DynamicValue::object();
    for attr in &schema.attributes {
        let path = AttributePath::new(&attr.name);
        let configured = lookup(config, &attr.name);

        let value = if !configured.is_null() || !attr.computed {
            configured
        } else if creating || config_changed {
            Dynamic::Unknown
        } else {
            lookup(prior_state, &attr.name)
        };

        // Paths are single attribute names, so this cannot fail on an object
        let _ = planned_state.set(&path, value);
    }

    let mut requires_replace = Vec::new();
    let mut diagnostics = Vec::new();

    for attr in &schema.attributes {
        if attr.plan_modifiers.is_empty() {
            continue;
        }

        let path = AttributePath::new(&attr.name);
        let state = lookup(prior_state, &attr.name);
        let config_value = lookup(config, &attr.name);
        let mut plan_value = lookup(&planned_state, &attr.name);
        let mut replace = false;

        for modifier in &attr.plan_modifiers {
            let response = modifier.modify_plan(PlanModifyRequest {
                state: state.clone(),
                plan: plan_value,
                config: config_value.clone(),
                attribute_path: path.clone(),
            });
            plan_value = response.plan_value;
            replace |= response.requires_replace;
            diagnostics.extend(response.diagnostics);
        }

        if replace {
            requires_replace.push(path.clone());
        }
        let _ = planned_state.set(&path, plan_value);
    }

    tracing::debug!(
        creating,
        config_changed,
        replace = requires_replace.len(),
        "planned resource change"
    );

    PlannedChange {
        planned_state,
        requires_replace,
        diagnostics,
    }
}
