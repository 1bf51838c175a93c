use crate::errors::CompilerError;
use crate::ir::{HttpMethod, OperationIr, OperationKind};
use crate::parsers::pointer;
use crate::subset_validator::{templated_segments, METHODS};
use serde_json::Value;

const JSON_MEDIA_TYPE: &str = "application/json";

/// One `(path, method)` pair as it appears in the resolved document
#[derive(Debug, Clone)]
pub struct RawOperation<'a> {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub node: &'a Value,
    pub pointer: String,
}

impl RawOperation<'_> {
    /// Declared `operationId`, else `METHOD:path`
    pub fn id(&self) -> String {
        self.operation_id
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.method, self.path))
    }

    pub fn path_params(&self) -> Vec<&str> {
        templated_segments(&self.path)
    }
}

/// Collect every get/post/put/patch/delete operation in sorted path order
pub fn extract_operations(root: &Value) -> Vec<RawOperation<'_>> {
    let mut operations = Vec::new();

    let Some(paths) = root.get("paths").and_then(Value::as_object) else {
        return operations;
    };

    let mut keys: Vec<&String> = paths.keys().collect();
    keys.sort();

    for path in keys {
        let Some(item) = paths[path].as_object() else {
            continue;
        };

        for method_key in METHODS {
            let (Some(node), Some(method)) = (item.get(method_key), HttpMethod::from_key(method_key))
            else {
                continue;
            };

            let operation_id = node
                .get("operationId")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string);

            let tags = node
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            operations.push(RawOperation {
                path: path.clone(),
                method,
                operation_id,
                tags,
                node,
                pointer: pointer::from_tokens(["paths", path.as_str(), method_key]),
            });
        }
    }

    operations
}

/// CRUD kind from `(method, path parameter count)`; `None` for anything else
pub fn infer_kind(method: HttpMethod, path_params: usize) -> Option<OperationKind> {
    match (method, path_params) {
        (HttpMethod::Get, 0) => Some(OperationKind::List),
        (HttpMethod::Get, 1) => Some(OperationKind::Detail),
        (HttpMethod::Post, 0) => Some(OperationKind::Create),
        (HttpMethod::Put, 1) | (HttpMethod::Patch, 1) => Some(OperationKind::Update),
        (HttpMethod::Delete, 1) => Some(OperationKind::Delete),
        _ => None,
    }
}

/// Map a raw operation onto its semantic IR form
pub fn process_operation(raw: &RawOperation<'_>) -> Result<OperationIr, CompilerError> {
    let params = raw.path_params();

    let kind = infer_kind(raw.method, params.len()).ok_or_else(|| {
        CompilerError::ir_invalid(format!(
            "non-CRUD operation: {} {} ({} path parameters)",
            raw.method,
            raw.path,
            params.len()
        ))
        .at(raw.pointer.clone())
    })?;

    let response_schema = success_response_schema(raw.node).cloned().ok_or_else(|| {
        CompilerError::ir_invalid(format!(
            "{} {} has no 200/201 application/json response schema",
            raw.method, raw.path
        ))
        .at(raw.pointer.clone())
    })?;

    let request_schema = request_body_schema(raw.node).cloned();
    if matches!(kind, OperationKind::Create | OperationKind::Update) && request_schema.is_none() {
        return Err(CompilerError::ir_invalid(format!(
            "{} {} ({}) has no application/json request body schema",
            raw.method, raw.path, kind
        ))
        .at(pointer::push(&raw.pointer, "requestBody")));
    }

    let identifier_param = match kind {
        OperationKind::Detail | OperationKind::Update | OperationKind::Delete => {
            params.first().map(|p| p.to_string())
        }
        _ => None,
    };

    Ok(OperationIr {
        id: raw.id(),
        method: raw.method,
        kind,
        path: raw.path.clone(),
        identifier_param,
        request_schema,
        response_schema,
    })
}

/// `responses.200` (else `201`) → `content.application/json.schema`
fn success_response_schema(operation: &Value) -> Option<&Value> {
    let responses = operation.get("responses")?;
    ["200", "201"]
        .iter()
        .filter_map(|code| responses.get(*code))
        .find_map(json_schema)
}

fn request_body_schema(operation: &Value) -> Option<&Value> {
    operation.get("requestBody").and_then(json_schema)
}

fn json_schema(holder: &Value) -> Option<&Value> {
    holder
        .get("content")?
        .get(JSON_MEDIA_TYPE)?
        .get("schema")
        .filter(|s| s.is_object())
}
