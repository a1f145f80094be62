// src/blockchain/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::keys::KeyError;
use super::memo::MemoError;
use super::operations::AssetError;

// --- Error types for node access ---

#[derive(Error, Debug)]
pub enum HiveError {
    #[error("request to {node} failed: {source}")]
    Transport {
        node: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected response from node: {0}")]
    Decode(String),
    #[error("no Hive API node is configured")]
    NoNodes,
    #[error("all Hive API nodes failed, last error: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Memo(#[from] MemoError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("invalid chain state: {0}")]
    ChainState(String),
}

impl HiveError {
    /// Failures worth retrying on another node.
    pub fn is_transport(&self) -> bool {
        matches!(self, HiveError::Transport { .. })
    }
}

// --- Account models ---

/// An account as returned by `condenser_api.get_accounts`.
///
/// Only the fields the server reads are typed; everything else is kept as-is
/// so the account can be returned verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub memo_key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `get_account_history`: `[index, entry]`.
pub type HistoryItem = (u64, HistoryEntry);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub trx_id: String,
    #[serde(default)]
    pub block: u64,
    #[serde(default)]
    pub timestamp: String,
    /// `[operation_type, operation_body]`
    pub op: (String, Value),
}

impl HistoryEntry {
    pub fn op_type(&self) -> &str {
        &self.op.0
    }

    pub fn op_data(&self) -> &Value {
        &self.op.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingDelegation {
    pub delegator: String,
    pub delegatee: String,
    pub vesting_shares: String,
    pub min_delegation_time: String,
}

// --- Content models ---

/// A post or comment from `get_content` / `get_discussions_by_*`.
///
/// A lookup for a missing post returns an object with an empty author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    pub author: String,
    pub permlink: String,
    pub title: String,
    pub body: String,
    pub created: String,
    pub last_update: String,
    pub category: String,
    pub json_metadata: String,
    pub net_votes: i64,
    pub pending_payout_value: String,
}

impl Content {
    /// Tags from the `json_metadata` string; empty when absent or unparseable.
    pub fn tags(&self) -> Vec<String> {
        serde_json::from_str::<Value>(&self.json_metadata)
            .ok()
            .and_then(|meta| meta.get("tags").and_then(Value::as_array).cloned())
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Sort orders accepted by `get_discussions_by_<query>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscussionQuery {
    Active,
    Cashout,
    Children,
    Comments,
    Created,
    Hot,
    Promoted,
    Trending,
    Votes,
    Blog,
    Feed,
}

impl DiscussionQuery {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscussionQuery::Active => "active",
            DiscussionQuery::Cashout => "cashout",
            DiscussionQuery::Children => "children",
            DiscussionQuery::Comments => "comments",
            DiscussionQuery::Created => "created",
            DiscussionQuery::Hot => "hot",
            DiscussionQuery::Promoted => "promoted",
            DiscussionQuery::Trending => "trending",
            DiscussionQuery::Votes => "votes",
            DiscussionQuery::Blog => "blog",
            DiscussionQuery::Feed => "feed",
        }
    }
}

// --- Chain state models ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u32,
    pub head_block_id: String,
    /// Head block time, `%Y-%m-%dT%H:%M:%S` in UTC.
    pub time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub base: String,
    pub quote: String,
}

/// Result of `broadcast_transaction_synchronous`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionConfirmation {
    pub id: String,
    pub block_num: u64,
    pub trx_num: u64,
    pub expired: bool,
}
