//! # MCP Handler Module
//!
//! Dispatches MCP requests for the Hive server. Tools live in
//! [`crate::tools`] and are reached through the registry on [`AppState`];
//! resources and prompts are answered here.
//!
//! ## Supported Methods
//!
//! - `initialize`, `ping`
//! - `tools/list`, `tools/call`
//! - `resources/list`, `resources/templates/list`, `resources/read`
//! - `prompts/list`, `prompts/get`
//!
//! Notifications (requests without an `id` member) are accepted and never
//! answered. An explicit `"id": null` is a request and is answered with a null id.

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::{
    mcp::{
        prompts,
        protocol::{
            error_codes, InitializeResult, Request, Response, ServerCapabilities, ServerInfo,
            PROTOCOL_VERSION,
        },
        resources::{self, ResourceError},
    },
    AppState,
};

const INSTRUCTIONS: &str =
    "Hive blockchain MCP server for reading accounts and posts, publishing content, voting, transfers, signatures and encrypted memos.";

pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    let Request {
        id, method, params, ..
    } = req;
    let Some(id) = id else {
        debug!("Notification {} needs no response", method);
        return None;
    };

    let response = match method.as_str() {
        "initialize" => handle_initialize(id, &state),
        "ping" => Response::success(id, json!({})),
        "tools/list" => Response::success(id, json!({ "tools": state.tools.list() })),
        "tools/call" => handle_tool_call(id, params, state).await,
        "resources/list" => Response::success(id, json!({ "resources": [] })),
        "resources/templates/list" => Response::success(
            id,
            json!({ "resourceTemplates": resources::templates() }),
        ),
        "resources/read" => handle_resource_read(id, params, state).await,
        "prompts/list" => Response::success(id, json!({ "prompts": prompts::list() })),
        "prompts/get" => handle_prompt_get(id, params),
        _ => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        ),
    };

    Some(response)
}

fn handle_initialize(id: Value, state: &AppState) -> Response {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities::static_lists(),
        server_info: ServerInfo {
            name: state.config.server_name.clone(),
            version: state.config.server_version.clone(),
        },
        instructions: Some(INSTRUCTIONS.to_string()),
    };
    match serde_json::to_value(&result) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Handles a 'tools/call' request by dispatching it to the registered tool.
async fn handle_tool_call(id: Value, params: Option<Value>, state: AppState) -> Response {
    let params = params.unwrap_or(Value::Null);
    let tool_name = match params.get("name").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params",
            )
        }
    };
    let args = params.get("arguments").cloned().unwrap_or(Value::Null);

    let Some(tool) = state.tools.get(&tool_name).cloned() else {
        warn!("Unknown tool requested: {}", tool_name);
        return Response::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("Unknown tool: {tool_name}"),
        );
    };

    match tool.call(state, args).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => Response::success(id, value),
            Err(e) => {
                error!("Failed to encode result of {}: {}", tool_name, e);
                Response::error(id, error_codes::INTERNAL_ERROR, e.to_string())
            }
        },
        Err(failure) => {
            warn!(tool = %tool_name, issues = failure.issues.len(), "Rejected tool arguments");
            let data = json!(failure);
            Response::error_with_data(id, error_codes::INVALID_PARAMS, failure.to_string(), data)
        }
    }
}

async fn handle_resource_read(id: Value, params: Option<Value>, state: AppState) -> Response {
    let uri = match params
        .as_ref()
        .and_then(|p| p.get("uri"))
        .and_then(Value::as_str)
    {
        Some(uri) => uri.to_string(),
        None => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing 'uri' field in params",
            )
        }
    };

    match resources::read(&state, &uri).await {
        Ok(result) => Response::success(id, result),
        Err(err @ (ResourceError::Unknown(_) | ResourceError::NotFound(_))) => {
            Response::error(id, error_codes::INVALID_PARAMS, err.to_string())
        }
        Err(err) => {
            error!("Resource read failed for {}: {}", uri, err);
            Response::error(id, error_codes::INTERNAL_ERROR, err.to_string())
        }
    }
}

fn handle_prompt_get(id: Value, params: Option<Value>) -> Response {
    let params = params.unwrap_or(Value::Null);
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Response::error(
            id,
            error_codes::INVALID_PARAMS,
            "Missing 'name' field in params",
        );
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match prompts::get(name, &arguments) {
        Some(prompt) => Response::success(id, prompt),
        None => Response::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("Unknown prompt: {name}"),
        ),
    }
}
