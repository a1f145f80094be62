//! Utility functions for the Hive MCP server: list-valued parameter parsing
//! and permlink generation.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default category for posts without tags.
pub const DEFAULT_TAG: &str = "blog";

const MAX_PERMLINK_LEN: usize = 255;

/// A list parameter given either as a JSON array or as text such as
/// `"a, b"` or `"['a','b']"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ListInput {
    List(Vec<String>),
    Text(String),
}

impl Default for ListInput {
    fn default() -> Self {
        ListInput::List(vec![DEFAULT_TAG.to_string()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Tags,
    OperationFilter,
}

impl ListKind {
    fn label(self) -> &'static str {
        match self {
            ListKind::Tags => "tags",
            ListKind::OperationFilter => "operation_filter",
        }
    }

    fn items(self) -> &'static str {
        match self {
            ListKind::Tags => "tags",
            ListKind::OperationFilter => "operation types",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not parse {}: {raw}. Please provide a comma-separated list or array of {}.", .kind.label(), .kind.items())]
pub struct NormalizeError {
    pub kind: ListKind,
    pub raw: String,
}

/// Turns a list parameter into an ordered list of strings.
pub fn normalize_list(input: &ListInput, kind: ListKind) -> Result<Vec<String>, NormalizeError> {
    let text = match input {
        ListInput::List(items) => return Ok(items.clone()),
        ListInput::Text(text) => text,
    };

    if text.trim().is_empty() {
        return Ok(match kind {
            ListKind::Tags => vec![DEFAULT_TAG.to_string()],
            ListKind::OperationFilter => Vec::new(),
        });
    }

    if text.starts_with('[') && text.ends_with(']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
            return items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    Value::Null => Ok("null".to_string()),
                    Value::Array(_) | Value::Object(_) => Err(NormalizeError {
                        kind,
                        raw: text.clone(),
                    }),
                })
                .collect();
        }
    }

    let inner = text.strip_prefix('[').unwrap_or(text);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    Ok(inner
        .split(',')
        .map(|piece| {
            let piece = strip_quote(piece.trim());
            match kind {
                ListKind::Tags => piece.to_lowercase(),
                ListKind::OperationFilter => piece.to_string(),
            }
        })
        .filter(|piece| !piece.is_empty())
        .collect())
}

/// Removes one leading and one trailing quote character.
fn strip_quote(piece: &str) -> &str {
    let piece = piece
        .strip_prefix(|c: char| c == '\'' || c == '"')
        .unwrap_or(piece);
    piece
        .strip_suffix(|c: char| c == '\'' || c == '"')
        .unwrap_or(piece)
}

/// Removes duplicates, keeping the first occurrence.
pub fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Slug for a post title: lowercase, only word characters, spaces and
/// hyphens, whitespace runs become one hyphen.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.truncate(MAX_PERMLINK_LEN);
    slug
}

/// Permlink for a new post; falls back to a timestamped one when the title
/// has nothing sluggable.
pub fn post_permlink(title: &str) -> String {
    let slug = slugify(title);
    if slug.trim_matches('-').is_empty() {
        format!("post-{}", base36(Utc::now().timestamp_millis().unsigned_abs()))
    } else {
        slug
    }
}

/// `re-<parent[..20]>-<base36 millis>`
pub fn comment_permlink(parent_permlink: &str) -> String {
    let parent: String = parent_permlink.chars().take(20).collect();
    format!(
        "re-{}-{}",
        parent,
        base36(Utc::now().timestamp_millis().unsigned_abs())
    )
}

pub fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
