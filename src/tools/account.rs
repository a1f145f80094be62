// src/tools/account.rs

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use validator::Validate;

use super::{find_account, validate_operation_filter};
use crate::mcp::registry::{ToolDescriptor, ToolError, ToolOutput};
use crate::utils::{normalize_list, ListInput, ListKind};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetAccountInfoParams {
    /// Hive username to fetch information for
    #[validate(length(min = 1))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetAccountHistoryParams {
    /// Hive username
    #[validate(length(min = 1))]
    pub username: String,
    /// Number of operations to return
    #[serde(default = "default_history_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
    /// Operation types to filter for, as an array or a comma-separated list
    /// (e.g. 'transfer, vote')
    #[serde(default)]
    #[validate(custom = "validate_operation_filter")]
    pub operation_filter: Option<ListInput>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetVestingDelegationsParams {
    /// Hive account to get delegations for
    #[validate(length(min = 1))]
    pub username: String,
    /// Maximum number of delegations to retrieve
    #[serde(default = "default_delegation_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: u32,
    /// Optional starting account for pagination
    #[serde(default)]
    pub from: Option<String>,
}

fn default_history_limit() -> u32 {
    10
}

fn default_delegation_limit() -> u32 {
    100
}

pub(crate) fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_account_info",
            "Fetches detailed information about a Hive blockchain account including balance, authority, voting power, and other account metrics.",
            get_account_info,
        ),
        ToolDescriptor::new(
            "get_account_history",
            "Retrieves transaction history for a Hive account with optional operation type filtering.",
            get_account_history,
        ),
        ToolDescriptor::new(
            "get_vesting_delegations",
            "Get a list of vesting delegations made by a specific Hive account",
            get_vesting_delegations,
        ),
    ]
}

pub async fn get_account_info(
    state: AppState,
    params: GetAccountInfoParams,
) -> Result<ToolOutput, ToolError> {
    match find_account(&state, &params.username).await? {
        Some(account) => ToolOutput::json(&account),
        None => Err(ToolError::NotFound(format!(
            "Error: Account {} not found",
            params.username
        ))),
    }
}

pub async fn get_account_history(
    state: AppState,
    params: GetAccountHistoryParams,
) -> Result<ToolOutput, ToolError> {
    let filter = match &params.operation_filter {
        Some(input) => normalize_list(input, ListKind::OperationFilter)?,
        None => Vec::new(),
    };

    let history = state
        .hive
        .get_account_history(&params.username, -1, params.limit)
        .await?;
    debug!(account = %params.username, fetched = history.len(), "Fetched account history");

    let operations: Vec<_> = history
        .into_iter()
        .filter(|(_, entry)| filter.is_empty() || filter.iter().any(|f| f == entry.op_type()))
        .map(|(index, entry)| {
            json!({
                "index": index,
                "type": entry.op_type(),
                "timestamp": entry.timestamp,
                "transaction_id": entry.trx_id,
                "details": entry.op_data(),
            })
        })
        .collect();

    Ok(ToolOutput::Json(json!({
        "account": params.username,
        "operations_count": operations.len(),
        "operations": operations,
    })))
}

pub async fn get_vesting_delegations(
    state: AppState,
    params: GetVestingDelegationsParams,
) -> Result<ToolOutput, ToolError> {
    let from = params.from.as_deref().unwrap_or("");
    let delegations = state
        .hive
        .get_vesting_delegations(&params.username, from, params.limit)
        .await?;

    Ok(ToolOutput::Json(json!({
        "account": params.username,
        "delegations_count": delegations.len(),
        "delegations": delegations,
    })))
}
