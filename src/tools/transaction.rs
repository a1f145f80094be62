// src/tools/transaction.rs

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::{broadcast_result, validate_positive, with_hint};
use crate::blockchain::operations::{Asset, AssetSymbol, TransferOperation, VoteOperation};
use crate::credentials::KeyRole;
use crate::mcp::registry::{ToolDescriptor, ToolError, ToolOutput};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct VoteOnPostParams {
    /// Author of the post to vote on
    #[validate(length(min = 1))]
    pub author: String,
    /// Permlink of the post to vote on
    #[validate(length(min = 1))]
    pub permlink: String,
    /// Vote weight from -10000 (100% downvote) to 10000 (100% upvote)
    #[validate(range(min = -10000, max = 10000))]
    pub weight: i16,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SendTokenParams {
    /// Recipient Hive username
    #[validate(length(min = 1))]
    pub to: String,
    /// Amount of tokens to send, greater than 0
    #[validate(custom = "validate_positive")]
    pub amount: f64,
    /// Currency to send: HIVE or HBD
    pub currency: AssetSymbol,
    /// Optional memo to include with the transaction
    #[serde(default)]
    pub memo: Option<String>,
}

pub(crate) fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "vote_on_post",
            "Vote on a Hive post (upvote or downvote) using the configured Hive account.",
            vote_on_post,
        ),
        ToolDescriptor::new(
            "send_token",
            "Send HIVE or HBD tokens to another Hive account using the configured account credentials.",
            send_token,
        ),
    ]
}

pub async fn vote_on_post(state: AppState, params: VoteOnPostParams) -> Result<ToolOutput, ToolError> {
    let (voter, key) = state.credentials.account_key(KeyRole::Posting)?;

    let vote = VoteOperation {
        voter: voter.clone(),
        author: params.author.clone(),
        permlink: params.permlink.clone(),
        weight: params.weight,
    };
    let confirmation = state.hive.vote(vote, &key).await?;
    info!(voter = %voter, author = %params.author, permlink = %params.permlink, trx_id = %confirmation.id, "Vote broadcast");

    Ok(ToolOutput::Json(broadcast_result(
        &state.config,
        &confirmation,
        json!({
            "voter": voter,
            "author": params.author,
            "permlink": params.permlink,
            "weight": params.weight,
        }),
    )))
}

pub async fn send_token(state: AppState, params: SendTokenParams) -> Result<ToolOutput, ToolError> {
    let (from, key) = state
        .credentials
        .account_key(KeyRole::Active)
        .map_err(|e| with_hint(e, "Note that transfers require an active key, not a posting key."))?;

    let amount = Asset::from_amount(params.amount, params.currency);
    if amount.amount <= 0 {
        return Err(ToolError::Invalid(format!(
            "Error: amount must be at least 0.001 {}",
            params.currency.as_str()
        )));
    }

    let transfer = TransferOperation {
        from: from.clone(),
        to: params.to.clone(),
        amount,
        memo: params.memo.clone().unwrap_or_default(),
    };
    let confirmation = state.hive.transfer(transfer, &key).await?;
    info!(from = %from, to = %params.to, amount = %amount, trx_id = %confirmation.id, "Transfer broadcast");

    Ok(ToolOutput::Json(broadcast_result(
        &state.config,
        &confirmation,
        json!({
            "from": from,
            "to": params.to,
            "amount": amount.to_string(),
            "memo": params.memo.unwrap_or_else(|| "(no memo)".to_string()),
        }),
    )))
}
