pub mod openapi_parser;
pub mod pointer;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use openapi_parser::parse_document;

/// Source syntax of an input document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Text starting with `{` or `[` is JSON, anything else is YAML
    pub fn detect(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('{') | Some('[') => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// OpenAPI major/minor line a document declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenApiVersion {
    #[serde(rename = "3.0")]
    V3_0,
    #[serde(rename = "3.1")]
    V3_1,
}

impl OpenApiVersion {
    /// `openapi: 3.1.x` selects 3.1; everything else (including a missing field) is 3.0
    pub fn detect(root: &Value) -> Self {
        match root.get("openapi").and_then(Value::as_str) {
            Some(v) if v.starts_with("3.1") => OpenApiVersion::V3_1,
            _ => OpenApiVersion::V3_0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V3_0 => "3.0",
            OpenApiVersion::V3_1 => "3.1",
        }
    }
}

/// A parsed document tree together with the version it declares
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub root: Value,
    pub version: OpenApiVersion,
    pub format: DocumentFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_format_from_first_char() {
        assert_eq!(DocumentFormat::detect("  {\"a\":1}"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::detect("[1]"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::detect("openapi: 3.0.0"), DocumentFormat::Yaml);
    }

    #[test]
    fn detects_version() {
        assert_eq!(OpenApiVersion::detect(&json!({"openapi": "3.1.0"})), OpenApiVersion::V3_1);
        assert_eq!(OpenApiVersion::detect(&json!({"openapi": "3.0.3"})), OpenApiVersion::V3_0);
        assert_eq!(OpenApiVersion::detect(&json!({"openapi": 3.1})), OpenApiVersion::V3_0);
        assert_eq!(OpenApiVersion::detect(&json!({})), OpenApiVersion::V3_0);
    }
}
