//! The final declarative artifact consumed by a generic CRUD renderer.

use crate::errors::CompilerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Enum,
}

impl FieldType {
    /// Types a list view can filter on
    pub fn is_filterable(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Number | FieldType::Enum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSpec {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSpec {
    pub entity: String,
    pub fields: Vec<Field>,
    pub table: TableSpec,
    pub form: FormSpec,
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
}

impl UiSpec {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Structural validity: non-empty fields, every column/form/filter
    /// reference resolves, every enum carries options.
    pub fn validate(&self) -> Result<(), CompilerError> {
        if self.fields.is_empty() {
            return Err(CompilerError::uispec_invalid(format!(
                "{}: no usable fields",
                self.entity
            )));
        }

        let names: BTreeSet<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        let references = [
            ("table.columns", &self.table.columns),
            ("form.fields", &self.form.fields),
            ("filters", &self.filters),
        ];
        for (section, entries) in references {
            if let Some(dangling) = entries.iter().find(|e| !names.contains(e.as_str())) {
                return Err(CompilerError::uispec_invalid(format!(
                    "{}: {} references unknown field '{}'",
                    self.entity, section, dangling
                ))
                .at(dangling.clone()));
            }
        }

        if let Some(field) = self.fields.iter().find(|f| {
            f.field_type == FieldType::Enum && f.options.as_ref().map_or(true, |o| o.is_empty())
        }) {
            return Err(CompilerError::uispec_invalid(format!(
                "{}: enum field '{}' has no options",
                self.entity, field.name
            ))
            .at(field.name.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn field(name: &str, field_type: FieldType) -> Field {
        Field {
            name: name.into(),
            label: name.into(),
            field_type,
            required: false,
            options: None,
            read_only: None,
        }
    }

    fn spec() -> UiSpec {
        UiSpec {
            entity: "Items".into(),
            fields: vec![field("name", FieldType::String), field("price", FieldType::Number)],
            table: TableSpec { columns: vec!["name".into()] },
            form: FormSpec { fields: vec!["name".into(), "price".into()] },
            filters: vec!["price".into()],
            id_field: Some("id".into()),
        }
    }

    #[test]
    fn accepts_consistent_spec() {
        assert!(spec().validate().is_ok());
    }

    #[test]
    fn rejects_dangling_references() {
        let mut s = spec();
        s.filters.push("ghost".into());
        let err = s.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::UispecInvalid);
        assert_eq!(err.json_pointer.as_deref(), Some("ghost"));
    }

    #[test]
    fn rejects_enum_without_options() {
        let mut s = spec();
        s.fields.push(field("status", FieldType::Enum));
        let err = s.validate().unwrap_err();
        assert!(err.message.contains("enum field 'status'"));
    }

    #[test]
    fn rejects_empty_field_list() {
        let mut s = spec();
        s.fields.clear();
        s.table.columns.clear();
        s.form.fields.clear();
        s.filters.clear();
        assert!(s.validate().unwrap_err().message.contains("no usable fields"));
    }

    #[test]
    fn serializes_renderer_shape() {
        let v = serde_json::to_value(spec()).unwrap();
        assert_eq!(v["idField"], "id");
        assert_eq!(v["fields"][0]["type"], "string");
        assert!(v["fields"][0].get("readOnly").is_none());
    }
}
