//! Strict structural validation of raw planner output.
//!
//! Unknown keys are rejected at every level and every field needs a
//! non-empty `path`. The first issue found is what gets reported.

use super::UiPlanIr;
use serde_json::Value;
use std::fmt;

/// First structural problem found in a plan payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanIssue {
    /// Dot/bracket location inside the payload (`resources[0].views.list`)
    pub location: String,
    pub message: String,
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// Validate a JSON payload against the UiPlanIR schema
pub fn validate_plan(payload: &Value) -> Result<UiPlanIr, PlanIssue> {
    let plan: UiPlanIr = serde_json::from_value(payload.clone()).map_err(|e| PlanIssue {
        location: String::new(),
        message: e.to_string(),
    })?;

    for (ri, resource) in plan.resources.iter().enumerate() {
        if resource.name.trim().is_empty() {
            return Err(PlanIssue {
                location: format!("resources[{}].name", ri),
                message: "must be a non-empty string".to_string(),
            });
        }
        for (kind, view) in resource.views.iter() {
            for (fi, field) in view.fields.iter().enumerate() {
                if field.path.trim().is_empty() {
                    return Err(PlanIssue {
                        location: format!(
                            "resources[{}].views.{}.fields[{}].path",
                            ri,
                            kind.as_str(),
                            fi
                        ),
                        message: "must be a non-empty string".to_string(),
                    });
                }
                if field.order.is_some_and(|o| !o.is_finite()) {
                    return Err(PlanIssue {
                        location: format!(
                            "resources[{}].views.{}.fields[{}].order",
                            ri,
                            kind.as_str(),
                            fi
                        ),
                        message: "must be a finite number".to_string(),
                    });
                }
            }
        }
    }

    Ok(plan)
}
