use super::{FieldPlan, UiPlanIr};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Canonical form of a schema-valid plan.
///
/// Resources sort by name; every view keeps the first entry per path and
/// sorts by `order` (missing last) then path.
pub fn normalize_plan(plan: &UiPlanIr) -> UiPlanIr {
    let mut normalized = plan.clone();
    normalized.resources.sort_by(|a, b| a.name.cmp(&b.name));

    for resource in &mut normalized.resources {
        for view in resource.views.iter_mut() {
            view.fields = normalize_fields(&view.fields);
        }
    }

    normalized
}

/// Dedupe by path (first occurrence wins) and sort
pub fn normalize_fields(fields: &[FieldPlan]) -> Vec<FieldPlan> {
    let mut seen = HashSet::new();
    let mut out: Vec<FieldPlan> = fields
        .iter()
        .filter(|f| seen.insert(f.path.clone()))
        .cloned()
        .collect();
    out.sort_by(field_order);
    out
}

/// `order` ascending with missing orders after every explicit one, then path
pub fn field_order(a: &FieldPlan, b: &FieldPlan) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order.then_with(|| a.path.cmp(&b.path))
}
