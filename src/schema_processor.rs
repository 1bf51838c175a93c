use crate::uispec::FieldType;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// What the UI model knows about one dot-path in a resource's schemas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub path: String,
    pub field_type: FieldType,
    pub required: bool,
    pub options: Option<Vec<String>>,
}

/// Dot-path → field info, in first-seen order
pub type FieldMap = IndexMap<String, FieldInfo>;

/// Shape of a schema node as far as flattening cares
#[derive(Debug, Clone, PartialEq)]
enum SchemaShape<'a> {
    Object(&'a Value),
    ArrayOfObjects(&'a Value),
    ArrayOfPrimitives,
    Leaf(FieldType, Option<Vec<String>>),
}

/// The object schema a response/request contributes.
///
/// Arrays (list responses) contribute their `items` schema.
pub fn object_schema(schema: &Value) -> Option<&Value> {
    match classify(schema) {
        SchemaShape::Object(obj) => Some(obj),
        SchemaShape::ArrayOfObjects(items) => Some(items),
        _ => None,
    }
}

/// Does the object schema literally declare a top-level property `name`?
pub fn declares_property(schema: &Value, name: &str) -> bool {
    object_schema(schema)
        .and_then(|s| s.get("properties"))
        .and_then(Value::as_object)
        .is_some_and(|props| props.contains_key(name))
}

/// Flatten `schema` into `fields`, OR-combining `required` with what is
/// already there. Array-of-primitive leaves are skipped: the UI model has
/// no array field type.
pub fn flatten_into(schema: &Value, fields: &mut FieldMap) {
    if let Some(obj) = object_schema(schema) {
        flatten_object(obj, "", fields);
    }
}

fn flatten_object(schema: &Value, prefix: &str, fields: &mut FieldMap) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut names: Vec<&String> = properties.keys().collect();
    names.sort();

    for name in names {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match classify(&properties[name]) {
            SchemaShape::Object(child) | SchemaShape::ArrayOfObjects(child) => {
                flatten_object(child, &path, fields);
            }
            SchemaShape::ArrayOfPrimitives => {}
            SchemaShape::Leaf(field_type, options) => {
                let is_required = required.contains(&name.as_str());
                fields
                    .entry(path.clone())
                    .and_modify(|existing| existing.required |= is_required)
                    .or_insert(FieldInfo {
                        path,
                        field_type,
                        required: is_required,
                        options,
                    });
            }
        }
    }
}

fn classify(schema: &Value) -> SchemaShape<'_> {
    if let Some(options) = enum_options(schema) {
        return SchemaShape::Leaf(FieldType::Enum, Some(options));
    }

    match schema_type(schema) {
        Some("object") => SchemaShape::Object(schema),
        Some("array") => match schema.get("items") {
            Some(items) if is_object_like(items) => SchemaShape::ArrayOfObjects(items),
            _ => SchemaShape::ArrayOfPrimitives,
        },
        Some("integer") | Some("number") => SchemaShape::Leaf(FieldType::Number, None),
        Some("boolean") => SchemaShape::Leaf(FieldType::Boolean, None),
        Some(_) => SchemaShape::Leaf(FieldType::String, None),
        None if schema.get("properties").is_some() => SchemaShape::Object(schema),
        None if schema.get("items").is_some() => match schema.get("items") {
            Some(items) if is_object_like(items) => SchemaShape::ArrayOfObjects(items),
            _ => SchemaShape::ArrayOfPrimitives,
        },
        None => SchemaShape::Leaf(FieldType::String, None),
    }
}

fn is_object_like(schema: &Value) -> bool {
    matches!(schema_type(schema), Some("object"))
        || (schema_type(schema).is_none() && schema.get("properties").is_some())
}

/// `type` as a string, or the first non-null entry of a 3.1 type array
fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// A non-empty, all-string `enum`
fn enum_options(schema: &Value) -> Option<Vec<String>> {
    let values = schema.get("enum")?.as_array()?;
    if values.is_empty() {
        return None;
    }
    values
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
