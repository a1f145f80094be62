// src/tools/crypto.rs

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use validator::Validate;

use crate::blockchain::keys::{message_digest, ADDRESS_PREFIX};
use crate::blockchain::{PublicKey, Signature};
use crate::credentials::KeyRole;
use crate::mcp::registry::{ToolDescriptor, ToolError, ToolOutput};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SignMessageParams {
    /// Message to sign
    #[validate(length(min = 1))]
    pub message: String,
    /// Type of key to use. Defaults to 'posting'.
    #[serde(default = "default_key_type")]
    pub key_type: KeyRole,
}

fn default_key_type() -> KeyRole {
    KeyRole::Posting
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct VerifySignatureParams {
    /// The SHA-256 hash of the message in hex format (64 characters)
    pub message_hash: String,
    /// Signature string to verify
    pub signature: String,
    /// Public key to verify against (with or without the STM prefix)
    #[validate(length(min = 1))]
    pub public_key: String,
}

pub(crate) fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "sign_message",
            "Sign a message using a Hive private key from environment variables.",
            sign_message,
        ),
        ToolDescriptor::new(
            "verify_signature",
            "Verify a digital signature against a Hive public key",
            verify_signature,
        ),
    ]
}

pub async fn sign_message(state: AppState, params: SignMessageParams) -> Result<ToolOutput, ToolError> {
    let key = state.credentials.signing_key(params.key_type)?;

    let digest = message_digest(params.message.as_bytes());
    let signature = key
        .sign(&digest)
        .map_err(|e| ToolError::Invalid(format!("Error signing message: {e}")))?;
    debug!(key_type = %params.key_type, "Message signed");

    Ok(ToolOutput::Json(json!({
        "success": true,
        "message_hash": hex::encode(digest),
        "signature": signature.to_string(),
        "public_key": key.public_key().to_string(),
    })))
}

pub async fn verify_signature(
    _state: AppState,
    params: VerifySignatureParams,
) -> Result<ToolOutput, ToolError> {
    let public_key = parse_public_key(&params.public_key)
        .ok_or_else(|| ToolError::Invalid("Error: Invalid public key format".to_string()))?;
    let signature: Signature = params
        .signature
        .parse()
        .map_err(|_| ToolError::Invalid("Error: Invalid signature format".to_string()))?;
    let digest = parse_digest(&params.message_hash).ok_or_else(|| {
        ToolError::Invalid(
            "Error: Invalid message hash format - must be a 64-character hex string".to_string(),
        )
    })?;

    Ok(ToolOutput::Json(json!({
        "success": true,
        "is_valid": public_key.verify(&digest, &signature),
        "message_hash": params.message_hash,
        "public_key": public_key.to_string(),
    })))
}

/// Accepts keys with or without the `STM` prefix.
fn parse_public_key(raw: &str) -> Option<PublicKey> {
    let raw = raw.trim();
    if raw.starts_with(ADDRESS_PREFIX) {
        raw.parse().ok()
    } else {
        format!("{ADDRESS_PREFIX}{raw}").parse().ok()
    }
}

fn parse_digest(raw: &str) -> Option<[u8; 32]> {
    if raw.len() != 64 {
        return None;
    }
    hex::decode(raw).ok()?.try_into().ok()
}
