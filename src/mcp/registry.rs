// src/mcp/registry.rs

//! Tool registration and the single wrapper every tool goes through.
//!
//! A tool is a typed parameter struct plus an async handler returning
//! `Result<ToolOutput, ToolError>`. The wrapper deserializes and validates the
//! arguments (failures become protocol errors and never reach the handler),
//! then turns whatever the handler produces, panics included, into a
//! [`ToolResponse`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};
use validator::{Validate, ValidationErrors};

use crate::blockchain::HiveError;
use crate::credentials::CredentialError;
use crate::mcp::response::ToolResponse;
use crate::utils::NormalizeError;
use crate::AppState;

/// What a handler hands back on success.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Text(String),
}

impl ToolOutput {
    pub fn json<T: Serialize>(data: &T) -> Result<Self, ToolError> {
        serde_json::to_value(data)
            .map(ToolOutput::Json)
            .map_err(|e| ToolError::Other(format!("failed to encode result: {e}")))
    }

    fn into_response(self) -> ToolResponse {
        match self {
            ToolOutput::Json(value) => ToolResponse::success(&value),
            ToolOutput::Text(text) => ToolResponse::success_text(text),
        }
    }
}

/// Runtime failure of a tool, reported inside the envelope.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    /// Shown verbatim.
    #[error("{0}")]
    NotFound(String),
    /// Shown verbatim.
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Hive(#[from] HiveError),
    #[error("{0}")]
    Other(String),
}

impl From<NormalizeError> for ToolError {
    fn from(err: NormalizeError) -> Self {
        ToolError::Invalid(format!("Error: {err}"))
    }
}

impl ToolError {
    /// Envelope text for a failure inside `operation`.
    pub fn message(&self, operation: &str) -> String {
        match self {
            ToolError::Credentials(e) => e.to_string(),
            ToolError::NotFound(m) | ToolError::Invalid(m) => m.clone(),
            ToolError::Hive(e) => format!("Error in {operation}: {e}"),
            ToolError::Other(m) => format!("Error in {operation}: {m}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// Arguments rejected before the handler ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Invalid arguments for tool {tool}")]
pub struct ValidationFailure {
    pub tool: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    fn from_serde(tool: &str, err: serde_json::Error) -> Self {
        let message = err.to_string();
        // serde names the offending field in backticks, e.g. "missing field `username`"
        let field = message
            .split('`')
            .nth(1)
            .filter(|_| message.starts_with("missing field") || message.starts_with("unknown field"))
            .unwrap_or("arguments")
            .to_string();
        Self {
            tool: tool.to_string(),
            issues: vec![ValidationIssue { field, message }],
        }
    }

    fn from_validator(tool: &str, errors: &ValidationErrors) -> Self {
        let mut issues: Vec<ValidationIssue> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationIssue {
                    field: field.to_string(),
                    message: match &e.message {
                        Some(m) => m.to_string(),
                        None => describe_code(&e.code, &e.params),
                    },
                })
            })
            .collect();
        issues.sort_by(|a, b| a.field.cmp(&b.field));
        Self {
            tool: tool.to_string(),
            issues,
        }
    }
}

fn describe_code(
    code: &str,
    params: &std::collections::HashMap<std::borrow::Cow<'static, str>, Value>,
) -> String {
    let bound = |k: &str| params.get(k).map(|v| v.to_string());
    match code {
        "range" => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            (None, None) => "is out of range".to_string(),
        },
        "length" => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => format!("length must be between {min} and {max}"),
            (Some(min), None) => format!("length must be at least {min}"),
            (None, Some(max)) => format!("length must be at most {max}"),
            (None, None) => "has an invalid length".to_string(),
        },
        other => format!("failed validation: {other}"),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

type CallFn =
    dyn Fn(AppState, Value) -> BoxFuture<'static, Result<ToolResponse, ValidationFailure>> + Send + Sync;

/// A named tool bound to its schema and handler.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    call: Arc<CallFn>,
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    pub fn new<P, F, Fut>(
        name: &'static str,
        description: &'static str,
        handler: F,
    ) -> Self
    where
        P: DeserializeOwned + Validate + JsonSchema + Send + 'static,
        F: Fn(AppState, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, ToolError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let call = move |state: AppState, args: Value| -> BoxFuture<'static, Result<ToolResponse, ValidationFailure>> {
            let handler = Arc::clone(&handler);
            async move {
                let params = parse_params::<P>(name, args)?;
                let outcome = AssertUnwindSafe(async move { (*handler)(state, params).await })
                    .catch_unwind()
                    .await;
                let response = match outcome {
                    Ok(Ok(output)) => {
                        debug!(tool = name, "Tool call succeeded");
                        output.into_response()
                    }
                    Ok(Err(err)) => {
                        warn!(tool = name, error = %err, "Tool call failed");
                        ToolResponse::error(err.message(name))
                    }
                    Err(panic) => {
                        let message = panic_message(panic);
                        error!(tool = name, "Tool handler panicked: {}", message);
                        ToolResponse::error(format!("Error in {name}: {message}"))
                    }
                };
                Ok(response)
            }
            .boxed()
        };
        Self {
            name,
            description,
            input_schema: input_schema::<P>(),
            call: Arc::new(call),
        }
    }

    pub async fn call(&self, state: AppState, args: Value) -> Result<ToolResponse, ValidationFailure> {
        (self.call)(state, args).await
    }

    /// Entry for `tools/list`.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

/// `inputSchema` derived from the parameter type; doc comments become
/// descriptions and `validate` bounds become schema bounds.
fn input_schema<P: JsonSchema>() -> Value {
    let mut schema = schemars::schema_for!(P).to_value();
    if let Some(root) = schema.as_object_mut() {
        root.remove("$schema");
    }
    schema
}

fn parse_params<P: DeserializeOwned + Validate>(tool: &str, args: Value) -> Result<P, ValidationFailure> {
    let args = if args.is_null() { json!({}) } else { args };
    let params: P =
        serde_json::from_value(args).map_err(|e| ValidationFailure::from_serde(tool, e))?;
    params
        .validate()
        .map_err(|e| ValidationFailure::from_validator(tool, &e))?;
    Ok(params)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(&'static str),
}

/// Registered tools, in registration order.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolDescriptor) -> Result<(), RegistryError> {
        if self.get(tool.name).is_some() {
            return Err(RegistryError::Duplicate(tool.name));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list(&self) -> Value {
        Value::Array(self.tools.iter().map(ToolDescriptor::to_json).collect())
    }
}
