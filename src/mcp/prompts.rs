// src/mcp/prompts.rs

use serde_json::{json, Value};

pub fn list() -> Value {
    json!([
        {
            "name": "create-post",
            "description": "Draft and publish a new Hive post",
            "arguments": [
                { "name": "title", "description": "Title of the post", "required": true },
                { "name": "content", "description": "Content of the post in markdown", "required": true },
                { "name": "tags", "description": "Comma-separated list of tags", "required": false }
            ]
        },
        {
            "name": "analyze-account",
            "description": "Summarize the activity of a Hive account",
            "arguments": [
                { "name": "username", "description": "Hive username to analyze", "required": true }
            ]
        }
    ])
}

/// Renders prompt `name`; `None` when no such prompt exists.
pub fn get(name: &str, arguments: &Value) -> Option<Value> {
    let arg = |key: &str, fallback: &'static str| -> String {
        arguments
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    let (description, text) = match name {
        "create-post" => (
            "Create a new Hive post",
            format!(
                "Please create a new post on the Hive blockchain with the following details:\n\
                 Title: {}\n\
                 Content: {}\n\
                 Tags: {}\n\n\
                 When done, please provide a link to the published post.",
                arg("title", "[Title]"),
                arg("content", "[Content]"),
                arg("tags", "hive,blog"),
            ),
        ),
        "analyze-account" => (
            "Analyze a Hive account",
            format!(
                "Please analyze the Hive account @{}. Include the following information:\n\
                 - Account age\n\
                 - Posting frequency\n\
                 - Number of followers and following\n\
                 - Common topics/tags\n\
                 - Reputation score\n\
                 - Recent activity",
                arg("username", "[username]"),
            ),
        ),
        _ => return None,
    };

    Some(json!({
        "description": description,
        "messages": [
            { "role": "user", "content": { "type": "text", "text": text } }
        ]
    }))
}
