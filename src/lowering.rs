//! Lowering: ApiIR schemas + normalized UiPlanIR → one UiSpec per resource.

use crate::errors::CompilerError;
use crate::ir::{capitalize, slugify, ApiIr, OperationKind, ResourceIr};
use crate::schema_processor::{declares_property, flatten_into, FieldMap};
use crate::uiplan::normalize::field_order;
use crate::uiplan::{FieldPlan, ResourcePlan, UiPlanIr, ViewKind};
use crate::uispec::{Field, FormSpec, TableSpec, UiSpec};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Lower a normalized plan into UiSpecs keyed by resource slug
pub fn lower(ir: &ApiIr, plan: &UiPlanIr) -> Result<BTreeMap<String, UiSpec>, CompilerError> {
    let mut specs = BTreeMap::new();

    for resource_plan in &plan.resources {
        let slug = slugify(&resource_plan.name);
        let resource = ir.resources.iter().find(|r| r.key == slug).ok_or_else(|| {
            CompilerError::uispec_invalid(format!(
                "plan resource '{}' matches no ApiIR resource",
                resource_plan.name
            ))
        })?;

        if specs.contains_key(&resource.key) {
            debug!(resource = %resource.key, "duplicate plan resource ignored");
            continue;
        }

        let spec = lower_resource(resource, resource_plan)?;
        debug!(resource = %resource.key, fields = spec.fields.len(), "lowered");
        specs.insert(resource.key.clone(), spec);
    }

    Ok(specs)
}

/// Flattened fields of the list/detail responses and create/update requests
pub fn schema_fields(resource: &ResourceIr) -> FieldMap {
    let mut fields = FieldMap::new();
    let schemas = [
        resource.operation(OperationKind::List).map(|op| &op.response_schema),
        resource.operation(OperationKind::Detail).map(|op| &op.response_schema),
        resource
            .operation(OperationKind::Create)
            .and_then(|op| op.request_schema.as_ref()),
        resource
            .operation(OperationKind::Update)
            .and_then(|op| op.request_schema.as_ref()),
    ];
    for schema in schemas.into_iter().flatten() {
        flatten_into(schema, &mut fields);
    }
    fields
}

fn lower_resource(resource: &ResourceIr, plan: &ResourcePlan) -> Result<UiSpec, CompilerError> {
    let schema = schema_fields(resource);

    let mut seen = HashSet::new();
    let mut planned: Vec<&FieldPlan> = plan
        .views
        .iter()
        .flat_map(|(_, view)| view.fields.iter())
        .filter(|f| schema.contains_key(&f.path) && seen.insert(f.path.as_str()))
        .collect();
    planned.sort_by(|a, b| field_order(a, b));

    let fields: Vec<Field> = planned
        .into_iter()
        .filter_map(|fp| {
            let info = schema.get(&fp.path)?;
            Some(Field {
                name: fp.path.clone(),
                label: label_for(fp),
                field_type: info.field_type,
                required: info.required,
                options: info.options.clone(),
                read_only: fp.read_only,
            })
        })
        .collect();

    let built: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    let first = fields.first().map(|f| f.name.clone());
    let view_paths = |kinds: &[ViewKind]| -> Vec<String> {
        let mut seen = HashSet::new();
        kinds
            .iter()
            .filter_map(|kind| plan.views.get(*kind))
            .flat_map(|view| view.paths())
            .filter(|p| built.contains(p) && seen.insert(*p))
            .map(str::to_string)
            .collect()
    };

    let list_paths = view_paths(&[ViewKind::List]);
    let form_paths = view_paths(&[ViewKind::Create, ViewKind::Edit]);

    let filters = list_paths
        .iter()
        .filter(|p| {
            fields
                .iter()
                .any(|f| &f.name == *p && f.field_type.is_filterable())
        })
        .cloned()
        .collect();

    let spec = UiSpec {
        entity: resource.name.clone(),
        table: TableSpec { columns: or_first(list_paths, &first) },
        form: FormSpec { fields: or_first(form_paths, &first) },
        filters,
        id_field: id_field(resource),
        fields,
    };

    spec.validate()?;
    Ok(spec)
}

fn or_first(paths: Vec<String>, first: &Option<String>) -> Vec<String> {
    if paths.is_empty() {
        first.iter().cloned().collect()
    } else {
        paths
    }
}

/// Identifier of the detail/update/delete operation, or `id` when the list
/// schema declares one
fn id_field(resource: &ResourceIr) -> Option<String> {
    let lists_id = resource
        .operation(OperationKind::List)
        .is_some_and(|op| declares_property(&op.response_schema, "id"));
    if lists_id {
        return Some("id".to_string());
    }

    [OperationKind::Detail, OperationKind::Update, OperationKind::Delete]
        .into_iter()
        .filter_map(|kind| resource.operation(kind))
        .find_map(|op| op.identifier_param.clone())
}

fn label_for(field: &FieldPlan) -> String {
    match field.label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => humanize(&field.path),
    }
}

/// Title-case the last dot segment: `owner.created_at` → `Created At`,
/// `firstName` → `First Name`
pub fn humanize(path: &str) -> String {
    let last = path.rsplit('.').next().unwrap_or(path);

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in last.chars() {
        if matches!(c, '_' | '-' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.iter().map(|w| capitalize(w)).collect::<Vec<_>>().join(" ")
}
