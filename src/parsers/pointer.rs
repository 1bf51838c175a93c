//! JSON-pointer (RFC 6901) helpers shared by the validator, the resolver and
//! the ApiIR builder.

use serde_json::Value;

/// Escape a single reference token (`~` → `~0`, `/` → `~1`)
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single reference token (`~1` → `/`, `~0` → `~`)
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Append one token to an existing pointer
pub fn push(pointer: &str, token: &str) -> String {
    format!("{}/{}", pointer, escape_token(token))
}

/// Build a pointer from raw (unescaped) tokens
pub fn from_tokens<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    from_tokens_under("", tokens)
}

/// Extend `base` with several raw tokens
pub fn from_tokens_under<I, S>(base: &str, tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .fold(base.to_string(), |acc, t| push(&acc, t.as_ref()))
}

/// Is this a document-local reference (`#/...`)?
pub fn is_local_ref(reference: &str) -> bool {
    reference.starts_with("#/")
}

/// Resolve a local `#/a/b` reference against `root`
pub fn resolve_local<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    lookup(root, pointer)
}

/// Look up a pointer of the form `/a/b~1c` in `root`
pub fn lookup<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(root);
    }
    let rest = pointer.strip_prefix('/')?;

    let mut current = root;
    for raw in rest.split('/') {
        let token = unescape_token(raw);
        current = match current {
            Value::Object(map) => map.get(&token)?,
            Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Extract the `$ref` string of a reference node, if it is one
pub fn ref_target(node: &Value) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_and_unescapes() {
        assert_eq!(escape_token("/items/{id}"), "~1items~1{id}");
        assert_eq!(escape_token("a~b"), "a~0b");
        assert_eq!(unescape_token("~1items~0x"), "/items~x");
    }

    #[test]
    fn builds_pointers() {
        assert_eq!(
            from_tokens(["paths", "/items", "get"]),
            "/paths/~1items/get"
        );
        assert_eq!(push("/paths", "application/json"), "/paths/application~1json");
    }

    #[test]
    fn resolves_local_refs() {
        let doc = json!({
            "components": {"schemas": {"a/b": {"type": "string"}, "list": [1, 2]}}
        });
        assert_eq!(
            resolve_local(&doc, "#/components/schemas/a~1b"),
            Some(&json!({"type": "string"}))
        );
        assert_eq!(resolve_local(&doc, "#/components/schemas/list/1"), Some(&json!(2)));
        assert_eq!(resolve_local(&doc, "#/components/missing"), None);
        assert_eq!(resolve_local(&doc, "other.yaml#/x"), None);
    }

    #[test]
    fn detects_local_refs() {
        assert!(is_local_ref("#/components/schemas/Item"));
        assert!(!is_local_ref("https://example.com/schema.json"));
        assert!(!is_local_ref("#"));
    }
}
