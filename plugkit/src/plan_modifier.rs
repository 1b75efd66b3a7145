use crate::types::{AttributePath, Diagnostic, Dynamic};

#[derive(Debug, Clone)]
pub struct PlanModifyRequest {
    pub state: Dynamic,
    pub plan: Dynamic,
    pub config: Dynamic,
    pub attribute_path: AttributePath,
}

#[derive(Debug, Clone)]
pub struct PlanModifyResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Adjusts the planned value of a single attribute
///
/// Modifiers run after the framework has produced a plan and can:
/// - Change the planned value
/// - Mark the attribute as forcing replacement of the resource
/// - Add warnings or errors to the plan
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> &str;

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse;
}

/// Marks an attribute as requiring replacement when it changes
///
/// Nothing is replaced while there is no prior value (the resource is being
/// created) or while either side is still unknown.
pub struct RequiresReplaceIfChanged;

impl PlanModifier for RequiresReplaceIfChanged {
    fn description(&self) -> &str {
        "changing this attribute replaces the resource"
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let requires_replace = match (&request.state, &request.plan) {
            (Dynamic::Null, _) | (Dynamic::Unknown, _) | (_, Dynamic::Unknown) => false,
            (state, plan) => state != plan,
        };

        let mut diagnostics = Vec::new();
        if requires_replace {
            tracing::debug!(attribute = %request.attribute_path, "change forces replacement");
            diagnostics.push(
                Diagnostic::warning(
                    format!(
                        "Attribute '{}' requires resource replacement",
                        request.attribute_path
                    ),
                    self.description(),
                )
                .with_attribute(request.attribute_path.clone()),
            );
        }

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics,
        }
    }
}

/// Keeps the prior state value when the planned value is unknown
///
/// Useful for computed attributes that do not change once set.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> &str {
        "once set, the value of this attribute in state will not change"
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let plan_value = match (&request.plan, &request.state) {
            (Dynamic::Unknown, Dynamic::Null) => request.plan,
            (Dynamic::Unknown, state) => state.clone(),
            _ => request.plan,
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Vec::new(),
        }
    }
}
