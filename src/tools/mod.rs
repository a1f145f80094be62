//! # Tools
//!
//! Every operation the server exposes over MCP, grouped by concern:
//!
//! - `account`: `get_account_info`, `get_account_history`, `get_vesting_delegations`
//! - `content`: `get_post_content`, `get_posts_by_tag`, `get_posts_by_user`
//! - `transaction`: `vote_on_post`, `send_token`
//! - `posting`: `create_post`, `create_comment`
//! - `crypto`: `sign_message`, `verify_signature`
//! - `chain`: `get_chain_properties`
//! - `messaging`: `encrypt_message`, `decrypt_message`, `send_encrypted_message`,
//!   `get_encrypted_messages`

use serde_json::{json, Map, Value};
use validator::ValidationError;

use crate::blockchain::models::{Account, TransactionConfirmation};
use crate::config::Config;
use crate::credentials::CredentialError;
use crate::mcp::registry::{RegistryError, ToolError, ToolRegistry};
use crate::utils::{normalize_list, ListInput, ListKind};
use crate::AppState;

pub mod account;
pub mod chain;
pub mod content;
pub mod crypto;
pub mod messaging;
pub mod posting;
pub mod transaction;

/// Registry holding every tool, in listing order.
pub fn registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    let all = account::tools()
        .into_iter()
        .chain(content::tools())
        .chain(transaction::tools())
        .chain(posting::tools())
        .chain(crypto::tools())
        .chain(chain::tools())
        .chain(messaging::tools());
    for tool in all {
        registry.register(tool)?;
    }
    Ok(registry)
}

/// Looks up a single account; `None` when the chain has no such name.
pub(crate) async fn find_account(state: &AppState, username: &str) -> Result<Option<Account>, ToolError> {
    let mut accounts = state.hive.get_accounts(&[username.to_string()]).await?;
    Ok(if accounts.is_empty() {
        None
    } else {
        Some(accounts.swap_remove(0))
    })
}

/// `success`, `transaction_id`, `transaction_url` and `block_num`, followed by
/// the tool-specific fields.
pub(crate) fn broadcast_result(
    config: &Config,
    confirmation: &TransactionConfirmation,
    fields: Value,
) -> Value {
    let mut out = Map::new();
    out.insert("success".into(), json!(true));
    out.insert("transaction_id".into(), json!(confirmation.id));
    out.insert(
        "transaction_url".into(),
        json!(config.transaction_url(&confirmation.id)),
    );
    out.insert("block_num".into(), json!(confirmation.block_num));
    if let Value::Object(extra) = fields {
        out.extend(extra);
    }
    Value::Object(out)
}

/// Appends a usage hint to a missing-credential message.
pub(crate) fn with_hint(err: CredentialError, hint: &str) -> ToolError {
    match err {
        CredentialError::Missing(_) => ToolError::Invalid(format!("{err}. {hint}")),
        other => ToolError::Credentials(other),
    }
}

pub(crate) fn default_true() -> bool {
    true
}

// --- validator hooks shared by several parameter structs ---

pub(crate) fn validate_tags(input: &ListInput) -> Result<(), ValidationError> {
    validate_list(input, ListKind::Tags)
}

pub(crate) fn validate_operation_filter(input: &ListInput) -> Result<(), ValidationError> {
    validate_list(input, ListKind::OperationFilter)
}

fn validate_list(input: &ListInput, kind: ListKind) -> Result<(), ValidationError> {
    normalize_list(input, kind).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("list");
        err.message = Some(e.to_string().into());
        err
    })
}

pub(crate) fn validate_positive(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than 0".into());
        Err(err)
    }
}
