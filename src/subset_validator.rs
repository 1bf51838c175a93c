//! Rejects OpenAPI constructs outside the supported subset.
//!
//! The validator never stops early: it walks every path and operation and
//! returns all violations in a deterministic order (sorted paths, fixed
//! method order, fixed check order inside an operation).

use crate::errors::{CompilerError, ErrorCode, Stage};
use crate::parsers::pointer;
use serde_json::Value;
use std::collections::BTreeSet;

/// Methods the subset understands, in reporting order
pub const METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

const SUCCESS_CODES: [&str; 2] = ["200", "201"];
const COMPOSITION_KEYWORDS: [&str; 3] = ["oneOf", "anyOf", "allOf"];
const JSON_MEDIA_TYPE: &str = "application/json";

/// Validate a parsed document. An empty error list is success.
pub fn validate_subset(root: &Value) -> Result<(), Vec<CompilerError>> {
    let mut errors = Vec::new();

    if let Some(paths) = root.get("paths").and_then(Value::as_object) {
        let mut keys: Vec<&String> = paths.keys().collect();
        keys.sort();

        for path in keys {
            let path_pointer = pointer::from_tokens(["paths", path.as_str()]);
            check_path_params(path, &path_pointer, &mut errors);

            let Some(item) = paths[path].as_object() else {
                continue;
            };
            for method in METHODS {
                if let Some(operation) = item.get(method) {
                    let op_pointer = pointer::push(&path_pointer, method);
                    check_operation(root, method, operation, &op_pointer, &mut errors);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Number of `{param}` segments in a path template
pub fn templated_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| s.len() > 2 && s.starts_with('{') && s.ends_with('}'))
        .map(|s| &s[1..s.len() - 1])
        .collect()
}

fn violation(code: ErrorCode, message: String, at: &str) -> CompilerError {
    CompilerError::new(code, Stage::Validate, message).at(at)
}

fn check_path_params(path: &str, at: &str, errors: &mut Vec<CompilerError>) {
    let params = templated_segments(path);
    if params.len() > 1 {
        errors.push(violation(
            ErrorCode::OasMultiplePathParams,
            format!(
                "path '{}' has {} templated segments; at most one is supported",
                path,
                params.len()
            ),
            at,
        ));
    }
}

fn check_operation(
    root: &Value,
    method: &str,
    operation: &Value,
    at: &str,
    errors: &mut Vec<CompilerError>,
) {
    if let Some(tags) = operation.get("tags").and_then(Value::as_array) {
        if tags.len() > 1 {
            errors.push(violation(
                ErrorCode::OasMultipleTags,
                format!(
                    "{} operation has {} tags; at most one is supported",
                    method.to_uppercase(),
                    tags.len()
                ),
                &pointer::push(at, "tags"),
            ));
        }
    }

    let responses = operation.get("responses").and_then(Value::as_object);
    let responses_pointer = pointer::push(at, "responses");

    if let Some(responses) = responses {
        let present: Vec<&str> = SUCCESS_CODES
            .iter()
            .copied()
            .filter(|code| responses.contains_key(*code))
            .collect();
        if present.len() > 1 {
            errors.push(violation(
                ErrorCode::OasMultipleSuccessResponses,
                format!(
                    "{} operation declares {} success responses ({}); exactly one of 200/201 is supported",
                    method.to_uppercase(),
                    present.len(),
                    present.join(", ")
                ),
                &responses_pointer,
            ));
        }
    }

    if matches!(method, "post" | "put" | "patch") && operation.get("requestBody").is_none() {
        errors.push(violation(
            ErrorCode::OasMissingRequestBody,
            format!("{} operation must declare a requestBody", method.to_uppercase()),
            at,
        ));
    }

    if let Some(responses) = responses {
        for code in SUCCESS_CODES {
            let Some(response) = responses.get(code) else {
                continue;
            };
            let response_pointer = pointer::push(&responses_pointer, code);
            // responses may themselves be local references
            let (response, response_pointer) = follow_ref(root, response, response_pointer);

            let schema = response
                .get("content")
                .and_then(|c| c.get(JSON_MEDIA_TYPE))
                .and_then(|m| m.get("schema"));
            if let Some(schema) = schema {
                let schema_pointer = pointer::from_tokens_under(
                    &response_pointer,
                    ["content", JSON_MEDIA_TYPE, "schema"],
                );
                let mut seen = BTreeSet::new();
                scan_schema(root, schema, &schema_pointer, &mut seen, errors);
            }
        }
    }
}

/// Dereference a local `$ref` once, returning the target and its pointer.
fn follow_ref<'a>(root: &'a Value, node: &'a Value, at: String) -> (&'a Value, String) {
    match pointer::ref_target(node) {
        Some(target) if pointer::is_local_ref(target) => match pointer::resolve_local(root, target) {
            Some(resolved) => (resolved, target[1..].to_string()),
            None => (node, at),
        },
        _ => (node, at),
    }
}

fn scan_schema(
    root: &Value,
    schema: &Value,
    at: &str,
    seen: &mut BTreeSet<String>,
    errors: &mut Vec<CompilerError>,
) {
    let Some(obj) = schema.as_object() else {
        return;
    };

    if let Some(target) = pointer::ref_target(schema) {
        // unresolvable and external refs are the resolver's concern
        if pointer::is_local_ref(target) && seen.insert(target.to_string()) {
            if let Some(resolved) = pointer::resolve_local(root, target) {
                scan_schema(root, resolved, &target[1..], seen, errors);
            }
        }
        return;
    }

    for keyword in COMPOSITION_KEYWORDS {
        if obj.contains_key(keyword) {
            errors.push(violation(
                ErrorCode::OasUnsupportedSchemaKeyword,
                format!("schema keyword '{}' is not supported", keyword),
                &pointer::push(at, keyword),
            ));
        }
    }

    if let Some(items) = obj.get("items") {
        scan_schema(root, items, &pointer::push(at, "items"), seen, errors);
    }

    if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
        let properties_pointer = pointer::push(at, "properties");
        let mut names: Vec<&String> = properties.keys().collect();
        names.sort();
        for name in names {
            scan_schema(
                root,
                &properties[name],
                &pointer::push(&properties_pointer, name),
                seen,
                errors,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes(errors: &[CompilerError]) -> Vec<ErrorCode> {
        errors.iter().map(|e| e.code).collect()
    }

    fn item_schema() -> Value {
        json!({"type": "object", "properties": {"id": {"type": "string"}}})
    }

    fn ok_response() -> Value {
        json!({"200": {"content": {"application/json": {"schema": item_schema()}}}})
    }

    #[test]
    fn accepts_supported_document() {
        let doc = json!({
            "paths": {
                "/items": {
                    "get": {"tags": ["Items"], "responses": ok_response()},
                    "post": {"requestBody": {"content": {}}, "responses": {"201": {}}}
                },
                "/items/{id}": {"delete": {"responses": ok_response()}}
            }
        });
        assert!(validate_subset(&doc).is_ok());
    }

    #[test]
    fn collects_every_violation_in_order() {
        let doc = json!({
            "paths": {
                "/b/{x}/{y}": {"get": {"responses": ok_response()}},
                "/a": {
                    "get": {"tags": ["A", "B"], "responses": {"200": {}, "201": {}}},
                    "post": {"responses": ok_response()}
                }
            }
        });
        let errors = validate_subset(&doc).unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![
                ErrorCode::OasMultipleTags,
                ErrorCode::OasMultipleSuccessResponses,
                ErrorCode::OasMissingRequestBody,
                ErrorCode::OasMultiplePathParams,
            ]
        );
        assert_eq!(errors[0].json_pointer.as_deref(), Some("/paths/~1a/get/tags"));
        assert_eq!(errors[2].json_pointer.as_deref(), Some("/paths/~1a/post"));
        assert_eq!(errors[3].json_pointer.as_deref(), Some("/paths/~1b~1{x}~1{y}"));
        assert_eq!(validate_subset(&doc).unwrap_err(), errors);
    }

    #[test]
    fn finds_composition_keywords_through_refs() {
        let doc = json!({
            "components": {"schemas": {
                "Pet": {"type": "object", "properties": {
                    "kind": {"oneOf": [{"type": "string"}, {"type": "number"}]},
                    "owner": {"$ref": "#/components/schemas/Owner"}
                }},
                "Owner": {"type": "object", "properties": {"pet": {"$ref": "#/components/schemas/Pet"}}}
            }},
            "paths": {"/pets": {"get": {"responses": {"200": {"content": {"application/json": {
                "schema": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}
            }}}}}}}
        });
        let errors = validate_subset(&doc).unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::OasUnsupportedSchemaKeyword]);
        assert_eq!(
            errors[0].json_pointer.as_deref(),
            Some("/components/schemas/Pet/properties/kind/oneOf")
        );
    }

    #[test]
    fn reports_inline_keyword_at_exact_pointer() {
        let doc = json!({
            "paths": {"/x": {"get": {"responses": {"201": {"content": {"application/json": {
                "schema": {"allOf": [], "anyOf": []}
            }}}}}}}
        });
        let errors = validate_subset(&doc).unwrap_err();
        let pointers: Vec<_> = errors.iter().filter_map(|e| e.json_pointer.clone()).collect();
        assert_eq!(
            pointers,
            vec![
                "/paths/~1x/get/responses/201/content/application~1json/schema/anyOf",
                "/paths/~1x/get/responses/201/content/application~1json/schema/allOf",
            ]
        );
    }

    #[test]
    fn counts_templated_segments() {
        assert_eq!(templated_segments("/items/{id}"), vec!["id"]);
        assert!(templated_segments("/items").is_empty());
        assert_eq!(templated_segments("/a/{b}/c/{d}").len(), 2);
    }
}
