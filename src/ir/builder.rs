use super::grouping::{choose_strategy, resource_of, GroupingStrategy};
use super::{ApiInfo, ApiIr, ResourceIr};
use crate::canonical::stable_hash;
use crate::errors::{CompilerError, ErrorCode, Stage};
use crate::operation_processor::{extract_operations, process_operation};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Result of the ApiIR stage
#[derive(Debug, Clone, PartialEq)]
pub struct ApiIrBuild {
    pub ir: ApiIr,
    /// sha256 of the assembled IR
    pub hash: String,
    pub strategy: GroupingStrategy,
}

/// Build the ApiIR from a resolved document
pub fn build_api_ir(root: &Value, path_prefixes: &[String]) -> Result<ApiIrBuild, CompilerError> {
    let raw_operations = extract_operations(root);
    if raw_operations.is_empty() {
        return Err(CompilerError::new(
            ErrorCode::OasAmbiguousResourceGrouping,
            Stage::ApiIr,
            "no CRUD operations found",
        )
        .at("/paths"));
    }

    let strategy = choose_strategy(&raw_operations);
    debug!(?strategy, operations = raw_operations.len(), "grouping operations");

    let mut resources: BTreeMap<String, ResourceIr> = BTreeMap::new();
    for raw in &raw_operations {
        let operation = process_operation(raw)?;
        let (key, name) = resource_of(raw, strategy, path_prefixes);
        resources
            .entry(key.clone())
            .or_insert_with(|| ResourceIr {
                name,
                key,
                operations: Vec::new(),
            })
            .operations
            .push(operation);
    }

    let mut resources: Vec<ResourceIr> = resources.into_values().collect();
    for resource in &mut resources {
        resource.operations.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.method.cmp(&b.method))
        });
    }

    let ir = ApiIr {
        api: api_info(root),
        resources,
    };
    let hash = stable_hash(&ir)
        .map_err(|e| CompilerError::ir_invalid(format!("failed to serialize ApiIR: {}", e)))?;

    Ok(ApiIrBuild { ir, hash, strategy })
}

fn api_info(root: &Value) -> ApiInfo {
    let info = root.get("info");
    let text = |key: &str, fallback: &str| {
        info.and_then(|i| i.get(key))
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };
    ApiInfo {
        title: text("title", "Untitled API"),
        version: text("version", "0.0.0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::grouping::DEFAULT_PATH_PREFIXES;
    use crate::ir::OperationKind;
    use serde_json::json;

    fn prefixes() -> Vec<String> {
        DEFAULT_PATH_PREFIXES.iter().map(|s| s.to_string()).collect()
    }

    fn schema() -> Value {
        json!({"content": {"application/json": {"schema": {"type": "object", "properties": {"id": {"type": "string"}}}}}})
    }

    fn items_doc(tag: Option<&str>) -> Value {
        let tags = tag.map(|t| json!([t])).unwrap_or(json!([]));
        json!({
            "info": {"title": "Shop", "version": "2.0"},
            "paths": {
                "/items/{id}": {
                    "delete": {"tags": tags, "responses": {"200": schema()}},
                    "put": {"tags": tags, "requestBody": schema(), "responses": {"200": schema()}},
                    "get": {"tags": tags, "responses": {"200": schema()}}
                },
                "/items": {
                    "post": {"tags": tags, "requestBody": schema(), "responses": {"201": schema()}},
                    "get": {"tags": tags, "responses": {"200": schema()}}
                }
            }
        })
    }

    #[test]
    fn groups_single_tag_resource_in_crud_order() {
        let build = build_api_ir(&items_doc(Some("Items")), &prefixes()).unwrap();
        assert_eq!(build.strategy, GroupingStrategy::Tag);
        assert_eq!(build.ir.api.title, "Shop");
        assert_eq!(build.ir.resources.len(), 1);

        let resource = &build.ir.resources[0];
        assert_eq!(resource.name, "Items");
        assert_eq!(resource.key, "items");
        let kinds: Vec<_> = resource.operations.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::List,
                OperationKind::Detail,
                OperationKind::Create,
                OperationKind::Update,
                OperationKind::Delete,
            ]
        );
        assert_eq!(build.hash.len(), 64);
    }

    #[test]
    fn falls_back_to_path_grouping() {
        let build = build_api_ir(&items_doc(None), &prefixes()).unwrap();
        assert_eq!(build.strategy, GroupingStrategy::Path);
        assert_eq!(build.ir.resources[0].name, "Items");
        assert_eq!(build.ir.resources[0].operations.len(), 5);
    }

    #[test]
    fn sorts_resources_by_key() {
        let doc = json!({"paths": {
            "/zebras": {"get": {"responses": {"200": schema()}}},
            "/api/apples": {"get": {"responses": {"200": schema()}}}
        }});
        let build = build_api_ir(&doc, &prefixes()).unwrap();
        let keys: Vec<_> = build.ir.resources.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["apples", "zebras"]);
        assert_eq!(build.ir.api.title, "Untitled API");
    }

    #[test]
    fn no_operations_is_a_grouping_error() {
        let err = build_api_ir(&json!({"paths": {"/x": {"head": {}}}}), &prefixes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::OasAmbiguousResourceGrouping);
        assert_eq!(err.message, "no CRUD operations found");
    }

    #[test]
    fn hash_is_stable() {
        let a = build_api_ir(&items_doc(Some("Items")), &prefixes()).unwrap();
        let b = build_api_ir(&items_doc(Some("Items")), &prefixes()).unwrap();
        assert_eq!(a, b);
    }
}
