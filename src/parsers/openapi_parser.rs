use super::{DocumentFormat, OpenApiVersion, ParsedDocument};
use crate::errors::CompilerError;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

/// Parse OpenAPI text (JSON or YAML) into a generic document tree.
///
/// Every failure is reported as a single `OAS_PARSE_ERROR`.
pub fn parse_document(text: &str) -> Result<ParsedDocument, CompilerError> {
    if text.trim().is_empty() {
        return Err(CompilerError::parse("document is empty"));
    }

    let format = DocumentFormat::detect(text);
    let root = match format {
        DocumentFormat::Json => serde_json::from_str::<Value>(text)
            .map_err(|e| CompilerError::parse(format!("invalid JSON: {}", e)))?,
        DocumentFormat::Yaml => {
            let yaml: YamlValue = serde_yaml::from_str(text)
                .map_err(|e| CompilerError::parse(format!("invalid YAML: {}", e)))?;
            yaml_to_json(yaml).map_err(CompilerError::parse)?
        }
    };

    match root {
        Value::Null => Err(CompilerError::parse("document is empty")),
        Value::Object(_) => {
            let version = OpenApiVersion::detect(&root);
            Ok(ParsedDocument {
                root,
                version,
                format,
            })
        }
        _ => Err(CompilerError::parse("document root must be an object")),
    }
}

/// Convert a YAML tree into the JSON tree every later stage works on.
///
/// Non-string mapping keys (`200:` in `responses`) become their string form.
pub fn yaml_to_json(value: YamlValue) -> Result<Value, String> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                Value::Number(
                    Number::from_f64(f)
                        .ok_or_else(|| format!("unsupported non-finite number: {}", n))?,
                )
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(mapping_key(&key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn mapping_key(key: &YamlValue) -> Result<String, String> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        _ => Err("unsupported mapping key (only scalar keys are allowed)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    #[test]
    fn parses_yaml_with_numeric_keys() {
        let doc = parse_document(
            r#"
openapi: 3.1.0
info:
  title: Demo
  version: "1"
paths:
  /items:
    get:
      responses:
        200:
          description: ok
"#,
        )
        .unwrap();
        assert_eq!(doc.version, OpenApiVersion::V3_1);
        assert_eq!(doc.format, DocumentFormat::Yaml);
        assert!(doc.root["paths"]["/items"]["get"]["responses"]["200"].is_object());
    }

    #[test]
    fn parses_json() {
        let doc = parse_document(r#"{"openapi":"3.0.3","paths":{}}"#).unwrap();
        assert_eq!(doc.version, OpenApiVersion::V3_0);
        assert_eq!(doc.root, json!({"openapi":"3.0.3","paths":{}}));
    }

    #[test]
    fn rejects_empty_input() {
        for text in ["", "   \n\t", "~", "null"] {
            let err = parse_document(text).unwrap_err();
            assert_eq!(err.code, ErrorCode::OasParseError, "input {:?}", text);
        }
    }

    #[test]
    fn rejects_non_object_roots() {
        let err = parse_document("[1, 2]").unwrap_err();
        assert_eq!(err.message, "document root must be an object");
        let err = parse_document("just a string").unwrap_err();
        assert_eq!(err.code, ErrorCode::OasParseError);
    }

    #[test]
    fn rejects_malformed_text() {
        let err = parse_document("{\"openapi\": ").unwrap_err();
        assert!(err.message.starts_with("invalid JSON"));
        let err = parse_document("a: [unclosed").unwrap_err();
        assert!(err.message.starts_with("invalid YAML"));
    }
}
