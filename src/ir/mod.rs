pub mod builder;
pub mod grouping;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use builder::{build_api_ir, ApiIrBuild};

/// Semantic intermediate representation of an OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiIr {
    pub api: ApiInfo,
    pub resources: Vec<ResourceIr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
}

/// A group of CRUD operations over one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIr {
    /// Display name (raw tag text or capitalized path segment)
    pub name: String,
    /// URL-safe slug, unique across resources
    pub key: String,
    pub operations: Vec<OperationIr>,
}

impl ResourceIr {
    /// First operation of the given kind, if any
    pub fn operation(&self, kind: OperationKind) -> Option<&OperationIr> {
        self.operations.iter().find(|op| op.kind == kind)
    }

    pub fn has_kind(&self, kind: OperationKind) -> bool {
        self.operation(kind).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationIr {
    pub id: String,
    pub method: HttpMethod,
    pub kind: OperationKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<Value>,
    pub response_schema: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD operation kind. Declaration order is the canonical sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    List,
    Detail,
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::List => "list",
            OperationKind::Detail => "detail",
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-case, URL-safe slug: runs of non-alphanumerics collapse into `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "resource".to_string()
    } else {
        slug
    }
}

/// Upper-case the first character
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies() {
        assert_eq!(slugify("Items"), "items");
        assert_eq!(slugify("Pet Store / Orders"), "pet-store-orders");
        assert_eq!(slugify("  --Users--  "), "users");
        assert_eq!(slugify("Ünïcode"), "n-code");
        assert_eq!(slugify("!!!"), "resource");
    }

    #[test]
    fn capitalizes() {
        assert_eq!(capitalize("items"), "Items");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn kinds_sort_in_crud_order() {
        let mut kinds = vec![
            OperationKind::Delete,
            OperationKind::Create,
            OperationKind::List,
            OperationKind::Update,
            OperationKind::Detail,
        ];
        kinds.sort();
        let names: Vec<_> = kinds.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["list", "detail", "create", "update", "delete"]);
    }

    #[test]
    fn serializes_camel_case_operation() {
        let op = OperationIr {
            id: "getItem".into(),
            method: HttpMethod::Get,
            kind: OperationKind::Detail,
            path: "/items/{id}".into(),
            identifier_param: Some("id".into()),
            request_schema: None,
            response_schema: serde_json::json!({"type": "object"}),
        };
        let v = serde_json::to_value(&op).unwrap();
        assert_eq!(v["identifierParam"], "id");
        assert_eq!(v["method"], "GET");
        assert_eq!(v["kind"], "detail");
        assert!(v.get("requestSchema").is_none());
    }
}
