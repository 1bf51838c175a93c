//! Inlines document-local `$ref` nodes.
//!
//! Resolution is depth-first in document walk order and stops at the first
//! external, unresolvable or circular reference. On success the returned
//! tree contains no `$ref` nodes.

use crate::errors::{CompilerError, ErrorCode, Stage};
use crate::parsers::pointer;
use serde_json::{Map, Value};

/// Resolve every local reference in `root`
pub fn resolve_refs(root: &Value) -> Result<Value, CompilerError> {
    let resolver = Resolver { root };
    let mut stack = Vec::new();
    resolver.resolve(root, "", &mut stack)
}

struct Resolver<'a> {
    root: &'a Value,
}

impl<'a> Resolver<'a> {
    fn resolve(&self, node: &Value, at: &str, stack: &mut Vec<String>) -> Result<Value, CompilerError> {
        match node {
            Value::Object(map) => {
                if let Some(reference) = pointer::ref_target(node) {
                    return self.resolve_ref(reference, at, stack);
                }
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = Map::new();
                for key in keys {
                    let child = self.resolve(&map[key], &pointer::push(at, key), stack)?;
                    out.insert(key.clone(), child);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.resolve(item, &pointer::push(at, &i.to_string()), stack))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_ref(&self, reference: &str, at: &str, stack: &mut Vec<String>) -> Result<Value, CompilerError> {
        let ref_pointer = pointer::push(at, "$ref");

        if !pointer::is_local_ref(reference) {
            return Err(CompilerError::new(
                ErrorCode::OasExternalRef,
                Stage::Resolve,
                format!("external reference '{}' is not supported", reference),
            )
            .at(ref_pointer));
        }

        if stack.iter().any(|r| r == reference) {
            let mut chain = stack.clone();
            chain.push(reference.to_string());
            return Err(CompilerError::new(
                ErrorCode::OasCircularRef,
                Stage::Resolve,
                format!("circular reference: {}", chain.join(" -> ")),
            )
            .at(ref_pointer));
        }

        let target = pointer::resolve_local(self.root, reference).ok_or_else(|| {
            CompilerError::new(
                ErrorCode::OasExternalRef,
                Stage::Resolve,
                format!("invalid ref target '{}'", reference),
            )
            .at(ref_pointer.clone())
        })?;

        stack.push(reference.to_string());
        let resolved = self.resolve(target, &reference[1..], stack);
        stack.pop();
        resolved
    }
}

/// Does any `$ref` node remain in the tree?
pub fn contains_ref(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("$ref") || map.values().any(contains_ref),
        Value::Array(items) => items.iter().any(contains_ref),
        _ => false,
    }
}
