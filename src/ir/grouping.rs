//! Resource grouping: by tag when every operation carries exactly one tag,
//! otherwise by a path-derived key for the whole document.

use super::{capitalize, slugify};
use crate::operation_processor::RawOperation;
use serde::{Deserialize, Serialize};

/// Default leading path segments ignored by path grouping
pub const DEFAULT_PATH_PREFIXES: [&str; 4] = ["api", "v1", "v2", "v3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingStrategy {
    Tag,
    Path,
}

/// Document-wide strategy choice
pub fn choose_strategy(operations: &[RawOperation<'_>]) -> GroupingStrategy {
    if !operations.is_empty() && operations.iter().all(|op| op.tags.len() == 1) {
        GroupingStrategy::Tag
    } else {
        GroupingStrategy::Path
    }
}

/// `(key, display name)` of the resource an operation belongs to
pub fn resource_of(
    operation: &RawOperation<'_>,
    strategy: GroupingStrategy,
    prefixes: &[String],
) -> (String, String) {
    match strategy {
        GroupingStrategy::Tag => {
            let tag = operation.tags.first().cloned().unwrap_or_default();
            (slugify(&tag), tag)
        }
        GroupingStrategy::Path => {
            let segment = path_segment(&operation.path, prefixes);
            (slugify(&segment), capitalize(&segment))
        }
    }
}

/// First non-prefix, non-templated path segment, lower-cased
pub fn path_segment(path: &str, prefixes: &[String]) -> String {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

    while let Some(first) = segments.peek() {
        if prefixes.iter().any(|p| p.eq_ignore_ascii_case(first)) {
            segments.next();
        } else {
            break;
        }
    }

    segments
        .find(|s| !(s.starts_with('{') && s.ends_with('}')))
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "resource".to_string())
}
