// src/tools/messaging.rs

//! Private messages carried in encrypted transfer memos.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use super::{broadcast_result, find_account, with_hint};
use crate::blockchain::memo::{self, MEMO_MARKER};
use crate::blockchain::operations::{Asset, AssetSymbol, TransferOperation};
use crate::blockchain::{PrivateKey, PublicKey};
use crate::credentials::KeyRole;
use crate::mcp::registry::{ToolDescriptor, ToolError, ToolOutput};
use crate::AppState;

const ENCRYPT_HINT: &str = "Encryption requires your private memo key.";
const DECRYPT_HINT: &str = "Decryption requires your private memo key.";
const DECRYPTION_FAILED: &str = "[Decryption failed]";

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct EncryptMessageParams {
    /// Message to encrypt
    #[validate(length(min = 1))]
    pub message: String,
    /// Hive username of the recipient
    #[validate(length(min = 1))]
    pub recipient: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct DecryptMessageParams {
    /// Encrypted message (starts with #)
    #[validate(custom = "validate_encrypted")]
    pub encrypted_message: String,
    /// Hive username of the sender
    #[validate(length(min = 1))]
    pub sender: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SendEncryptedMessageParams {
    /// Message to encrypt and send
    #[validate(length(min = 1))]
    pub message: String,
    /// Hive username of the recipient
    #[validate(length(min = 1))]
    pub recipient: String,
    /// Amount of HIVE to send (minimum 0.001)
    #[serde(default = "default_message_amount")]
    #[validate(range(min = 0.001))]
    pub amount: f64,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetEncryptedMessagesParams {
    /// Hive username to fetch encrypted messages for. Defaults to HIVE_USERNAME.
    #[serde(default)]
    pub username: Option<String>,
    /// Maximum number of messages to retrieve
    #[serde(default = "default_message_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
    /// Whether to attempt decryption of messages
    #[serde(default)]
    pub decrypt: bool,
}

fn default_message_amount() -> f64 {
    0.001
}

fn default_message_limit() -> u32 {
    20
}

#[allow(clippy::ptr_arg)]
fn validate_encrypted(raw: &String) -> Result<(), ValidationError> {
    if memo::is_encrypted(raw) {
        Ok(())
    } else {
        let mut err = ValidationError::new("memo");
        err.message = Some(format!("must start with '{MEMO_MARKER}'").into());
        Err(err)
    }
}

/// Direction of a memo transfer relative to the queried account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Received,
    Sent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncryptedMessage {
    pub index: u64,
    pub transaction_id: String,
    pub timestamp: String,
    pub direction: Direction,
    pub counterparty: String,
    pub amount: String,
    pub encrypted_message: String,
    pub decrypted_message: Option<String>,
}

pub(crate) fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "encrypt_message",
            "Encrypt a message for a specific Hive account using memo encryption",
            encrypt_message,
        ),
        ToolDescriptor::new(
            "decrypt_message",
            "Decrypt an encrypted message received from a specific Hive account",
            decrypt_message,
        ),
        ToolDescriptor::new(
            "send_encrypted_message",
            "Send an encrypted message to a Hive account using a small token transfer",
            send_encrypted_message,
        ),
        ToolDescriptor::new(
            "get_encrypted_messages",
            "Retrieve encrypted messages from account history with optional decryption",
            get_encrypted_messages,
        ),
    ]
}

/// Public memo key of `username`, straight from the chain.
async fn memo_public_key(state: &AppState, username: &str) -> Result<PublicKey, ToolError> {
    let fetch_error =
        |reason: String| ToolError::Other(format!("Error fetching memo key for {username}: {reason}"));
    let account = find_account(state, username)
        .await?
        .ok_or_else(|| fetch_error(format!("User {username} not found")))?;
    account
        .memo_key
        .parse()
        .map_err(|e| fetch_error(format!("invalid memo key: {e}")))
}

fn memo_key(state: &AppState, hint: &str) -> Result<PrivateKey, ToolError> {
    state
        .credentials
        .signing_key(KeyRole::Memo)
        .map_err(|e| with_hint(e, hint))
}

pub async fn encrypt_message(
    state: AppState,
    params: EncryptMessageParams,
) -> Result<ToolOutput, ToolError> {
    let key = memo_key(&state, ENCRYPT_HINT)?;
    let recipient_key = memo_public_key(&state, &params.recipient).await?;

    let encrypted = memo::encode(&key, &recipient_key, &params.message)
        .map_err(|e| ToolError::Other(e.to_string()))?;

    Ok(ToolOutput::Json(json!({
        "success": true,
        "recipient": params.recipient,
        "encrypted_message": encrypted,
        "note": "This encrypted message can only be decrypted by the recipient using their private memo key.",
    })))
}

pub async fn decrypt_message(
    state: AppState,
    params: DecryptMessageParams,
) -> Result<ToolOutput, ToolError> {
    let key = memo_key(&state, DECRYPT_HINT)?;
    // confirms the sender exists; the memo itself names both keys
    memo_public_key(&state, &params.sender).await?;

    let decrypted = memo::decode(&key, &params.encrypted_message).map_err(|e| {
        ToolError::Invalid(format!(
            "Failed to decrypt message: {e}. This could be because the message was not encrypted for you, or the sender information is incorrect."
        ))
    })?;

    Ok(ToolOutput::Json(json!({
        "success": true,
        "sender": params.sender,
        "decrypted_message": decrypted,
    })))
}

pub async fn send_encrypted_message(
    state: AppState,
    params: SendEncryptedMessageParams,
) -> Result<ToolOutput, ToolError> {
    let (from, active_key) = state
        .credentials
        .account_key(KeyRole::Active)
        .map_err(|e| with_hint(e, "Sending requires an active key."))?;
    let memo_private = memo_key(&state, ENCRYPT_HINT)?;
    let recipient_key = memo_public_key(&state, &params.recipient).await?;

    let encrypted = memo::encode(&memo_private, &recipient_key, &params.message)
        .map_err(|e| ToolError::Other(e.to_string()))?;
    let amount = Asset::from_amount(params.amount, AssetSymbol::Hive);

    let transfer = TransferOperation {
        from: from.clone(),
        to: params.recipient.clone(),
        amount,
        memo: encrypted.clone(),
    };
    let confirmation = state.hive.transfer(transfer, &active_key).await?;
    info!(from = %from, to = %params.recipient, trx_id = %confirmation.id, "Encrypted message sent");

    Ok(ToolOutput::Json(broadcast_result(
        &state.config,
        &confirmation,
        json!({
            "from": from,
            "to": params.recipient,
            "amount": amount.to_string(),
            "encrypted_message": encrypted,
        }),
    )))
}

pub async fn get_encrypted_messages(
    state: AppState,
    params: GetEncryptedMessagesParams,
) -> Result<ToolOutput, ToolError> {
    let username = match params.username.filter(|u| !u.trim().is_empty()) {
        Some(name) => name,
        None => state.credentials.username().ok_or_else(|| {
            ToolError::Invalid(
                "Error: No username provided and HIVE_USERNAME environment variable is not set"
                    .to_string(),
            )
        })?,
    };

    // Over-fetch: most history entries are not memo transfers.
    let history = state
        .hive
        .get_account_history(&username, -1, params.limit * 3)
        .await?;

    let mut messages: Vec<EncryptedMessage> = history
        .into_iter()
        .rev()
        .filter(|(_, entry)| entry.op_type() == "transfer")
        .filter_map(|(index, entry)| {
            let op = entry.op_data();
            let memo = op.get("memo").and_then(|m| m.as_str())?;
            if !memo::is_encrypted(memo) {
                return None;
            }
            let field = |name: &str| op.get(name).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            let (direction, counterparty) = if field("to") == username {
                (Direction::Received, field("from"))
            } else {
                (Direction::Sent, field("to"))
            };
            Some(EncryptedMessage {
                index,
                transaction_id: entry.trx_id.clone(),
                timestamp: entry.timestamp.clone(),
                direction,
                counterparty,
                amount: field("amount"),
                encrypted_message: memo.to_string(),
                decrypted_message: None,
            })
        })
        .take(params.limit as usize)
        .collect();

    if params.decrypt {
        match state.credentials.signing_key(KeyRole::Memo) {
            Ok(key) => {
                for message in &mut messages {
                    let index = message.index;
                    let text = memo::decode(&key, &message.encrypted_message).unwrap_or_else(|e| {
                        warn!(index, "Failed to decrypt message: {}", e);
                        DECRYPTION_FAILED.to_string()
                    });
                    message.decrypted_message = Some(text);
                }
            }
            Err(e) => warn!("Skipping decryption: {}", e),
        }
    }

    let note = if params.decrypt {
        "Messages were decrypted using your private memo key"
    } else {
        "Set 'decrypt' parameter to true to attempt decryption of messages"
    };
    Ok(ToolOutput::Json(json!({
        "account": username,
        "messages_count": messages.len(),
        "messages": messages,
        "note": note,
    })))
}
