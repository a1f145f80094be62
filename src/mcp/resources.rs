// src/mcp/resources.rs

//! Read-only `hive://` resources.

use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use super::response::JSON_MIME_TYPE;
use crate::blockchain::HiveError;
use crate::AppState;

const SCHEME: &str = "hive";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// `hive://accounts/{account}`
    Account(String),
    /// `hive://posts/{author}/{permlink}`
    Post { author: String, permlink: String },
}

impl ResourceUri {
    pub fn parse(raw: &str) -> Result<Self, ResourceError> {
        let unknown = || ResourceError::Unknown(raw.to_string());
        let url = Url::parse(raw).map_err(|_| unknown())?;
        if url.scheme() != SCHEME {
            return Err(unknown());
        }
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        match (url.host_str(), segments.as_slice()) {
            (Some("accounts"), [account]) => Ok(ResourceUri::Account(account.to_string())),
            (Some("posts"), [author, permlink]) => Ok(ResourceUri::Post {
                author: author.to_string(),
                permlink: permlink.to_string(),
            }),
            _ => Err(unknown()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Unknown resource: {0}")]
    Unknown(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Failed to read resource: {0}")]
    Hive(#[from] HiveError),
}

/// Templates for `resources/templates/list`.
pub fn templates() -> Value {
    json!([
        {
            "uriTemplate": "hive://accounts/{account}",
            "name": "account",
            "description": "A Hive account as returned by the chain",
            "mimeType": JSON_MIME_TYPE,
        },
        {
            "uriTemplate": "hive://posts/{author}/{permlink}",
            "name": "post",
            "description": "Title, author and body of a Hive post",
            "mimeType": "text/plain",
        }
    ])
}

/// Result body for `resources/read`.
pub async fn read(state: &AppState, uri: &str) -> Result<Value, ResourceError> {
    let (mime_type, text) = match ResourceUri::parse(uri)? {
        ResourceUri::Account(name) => {
            let account = state
                .hive
                .get_accounts(&[name.clone()])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ResourceError::NotFound(format!("Account {name} not found")))?;
            let text = serde_json::to_string_pretty(&account)
                .map_err(|e| HiveError::Decode(e.to_string()))?;
            (JSON_MIME_TYPE, text)
        }
        ResourceUri::Post { author, permlink } => {
            let content = state.hive.get_content(&author, &permlink).await?;
            if content.author.is_empty() {
                return Err(ResourceError::NotFound(format!(
                    "Post not found: {author}/{permlink}"
                )));
            }
            let text = format!(
                "Title: {}\nAuthor: {}\nBody: {}",
                content.title, content.author, content.body
            );
            ("text/plain", text)
        }
    };

    Ok(json!({
        "contents": [{ "uri": uri, "mimeType": mime_type, "text": text }]
    }))
}
