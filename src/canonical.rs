//! Canonical JSON form and content hashing.
//!
//! The canonical form drops non-semantic keys (`description`, `example`,
//! `summary`), sorts name-keyed and primitive arrays, and serializes with
//! sorted object keys and no whitespace. Its sha256 is the document hash,
//! and the first 12 hex characters of that hash are the compile id.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

/// Keys that never contribute to the hash
pub const NON_SEMANTIC_KEYS: [&str; 3] = ["description", "example", "summary"];

/// Length of a compile id in hex characters
pub const ID_LEN: usize = 12;

/// Produce the canonical tree of `value`
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                if NON_SEMANTIC_KEYS.contains(&key.as_str()) {
                    continue;
                }
                out.insert(key.clone(), canonicalize(child));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(canonicalize).collect();
            if is_name_keyed(&items) {
                items.sort_by(|a, b| {
                    natural_cmp(&name_of(a), &name_of(b))
                        .then_with(|| to_canonical_string(a).cmp(&to_canonical_string(b)))
                });
            } else if is_primitive(&items) {
                items.sort_by(primitive_cmp);
            }
            Value::Array(items)
        }
        other => other.clone(),
    }
}

/// Serialize a tree with sorted keys and no insignificant whitespace
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Canonicalize then serialize
pub fn canonical_json(value: &Value) -> String {
    to_canonical_string(&canonicalize(value))
}

/// Lowercase hex sha256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Content hash of a document tree
pub fn content_hash(value: &Value) -> String {
    sha256_hex(canonical_json(value).as_bytes())
}

/// Hash of any serializable value using the stable key-sorted encoding
/// (no stripping or array reordering).
pub fn stable_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let tree = serde_json::to_value(value)?;
    Ok(sha256_hex(to_canonical_string(&tree).as_bytes()))
}

/// Derive the compile id from a content hash.
///
/// Without a session token the id is content addressed; with one, the same
/// document compiles to a per-author id.
pub fn compile_id(hash: &str, session_token: Option<&str>) -> String {
    match session_token {
        Some(token) => {
            let salted = sha256_hex(format!("{}{}", hash, token).as_bytes());
            salted[..ID_LEN].to_string()
        }
        None => hash.chars().take(ID_LEN).collect(),
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    // serde_json's string escaping is stable and never fails for &str
    match serde_json::to_string(s) {
        Ok(encoded) => out.push_str(&encoded),
        Err(_) => out.push_str("\"\""),
    }
}

/// Arrays of objects that carry a `name` key (OpenAPI parameter lists, tag lists)
fn is_name_keyed(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.as_object().is_some_and(|o| o.contains_key("name")))
}

fn is_primitive(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| matches!(item, Value::String(_) | Value::Number(_)))
}

fn name_of(item: &Value) -> String {
    match item.get("name") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => to_canonical_string(other),
        None => String::new(),
    }
}

/// Numbers sort before strings; within a type the order is total.
fn primitive_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
                .then_with(|| a.to_string().cmp(&b.to_string()))
        }
        (Value::String(x), Value::String(y)) => natural_cmp(x, y),
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        _ => to_canonical_string(a).cmp(&to_canonical_string(b)),
    }
}

/// Numeric-aware, case-insensitive collation with a byte-order tie break.
///
/// Digit runs compare by value (`item2` < `item10`), everything else
/// compares case-insensitively; equal keys fall back to raw byte order so
/// the ordering stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let l = take_digits(&mut left);
                let r = take_digits(&mut right);
                let lt = l.trim_start_matches('0');
                let rt = r.trim_start_matches('0');
                let ord = lt.len().cmp(&rt.len()).then_with(|| lt.cmp(rt));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = Iterator::cmp(x.to_lowercase(), y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }

    a.cmp(b)
}

fn take_digits<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}
