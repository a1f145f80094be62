// src/mcp/response.rs

//! The uniform tool result envelope: exactly one text block, flagged with
//! `isError` only on failure.

use serde::{Deserialize, Serialize};
use tracing::error;

pub const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ContentBlock {
    fn text(text: String, mime_type: Option<&str>) -> Self {
        Self {
            kind: "text".to_string(),
            text,
            mime_type: mime_type.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResponse {
    /// Pretty-printed JSON of `data`.
    pub fn success<T: Serialize + ?Sized>(data: &T) -> Self {
        match serde_json::to_string_pretty(data) {
            Ok(text) => Self {
                content: vec![ContentBlock::text(text, Some(JSON_MIME_TYPE))],
                is_error: false,
            },
            Err(e) => {
                error!("Failed to serialize tool result: {}", e);
                Self::error(format!("Error serializing response: {e}"))
            }
        }
    }

    pub fn success_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text.into(), None)],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message.into(), None)],
            is_error: true,
        }
    }

    /// Text of the single content block.
    pub fn text(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or_default()
    }
}
