//! Blockchain client module for the Hive network.
//!
//! `HiveApi` is the seam the tool handlers depend on; `HiveClient` implements
//! it against `condenser_api` over HTTP JSON-RPC, failing over across the
//! configured nodes when a node cannot be reached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::blockchain::{
    keys::PrivateKey,
    models::{
        Account, Content, DiscussionQuery, DynamicGlobalProperties, HiveError, HistoryItem, Price,
        TransactionConfirmation, VestingDelegation,
    },
    operations::{CommentOperation, CommentOptionsOperation, Operation, TransferOperation, VoteOperation},
    transaction::{Transaction, CHAIN_ID, DEFAULT_EXPIRATION_SECS},
};

/// Public API nodes used when none are configured.
pub const DEFAULT_NODES: [&str; 4] = [
    "https://api.hive.blog",
    "https://api.hivekings.com",
    "https://anyx.io",
    "https://api.openhive.network",
];

/// Read and broadcast access to a Hive node.
#[async_trait]
pub trait HiveApi: Send + Sync {
    async fn get_accounts(&self, names: &[String]) -> Result<Vec<Account>, HiveError>;

    /// `from = -1` starts at the most recent entry.
    async fn get_account_history(
        &self,
        account: &str,
        from: i64,
        limit: u32,
    ) -> Result<Vec<HistoryItem>, HiveError>;

    async fn get_vesting_delegations(
        &self,
        account: &str,
        from: &str,
        limit: u32,
    ) -> Result<Vec<VestingDelegation>, HiveError>;

    async fn get_content(&self, author: &str, permlink: &str) -> Result<Content, HiveError>;

    async fn get_discussions(
        &self,
        query: DiscussionQuery,
        tag: &str,
        limit: u32,
    ) -> Result<Vec<Content>, HiveError>;

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, HiveError>;

    async fn get_chain_properties(&self) -> Result<Value, HiveError>;

    async fn get_current_median_history_price(&self) -> Result<Price, HiveError>;

    /// Signs `operations` with `key` and waits for block inclusion.
    async fn broadcast(
        &self,
        operations: Vec<Operation>,
        key: &PrivateKey,
    ) -> Result<TransactionConfirmation, HiveError>;

    async fn vote(
        &self,
        vote: VoteOperation,
        key: &PrivateKey,
    ) -> Result<TransactionConfirmation, HiveError> {
        self.broadcast(vec![Operation::Vote(vote)], key).await
    }

    async fn transfer(
        &self,
        transfer: TransferOperation,
        key: &PrivateKey,
    ) -> Result<TransactionConfirmation, HiveError> {
        self.broadcast(vec![Operation::Transfer(transfer)], key).await
    }

    async fn comment(
        &self,
        comment: CommentOperation,
        key: &PrivateKey,
    ) -> Result<TransactionConfirmation, HiveError> {
        self.broadcast(vec![Operation::Comment(comment)], key).await
    }

    /// Comment and its options in one transaction.
    async fn comment_with_options(
        &self,
        comment: CommentOperation,
        options: CommentOptionsOperation,
        key: &PrivateKey,
    ) -> Result<TransactionConfirmation, HiveError> {
        self.broadcast(
            vec![Operation::Comment(comment), Operation::CommentOptions(options)],
            key,
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// HTTP JSON-RPC client for `condenser_api`.
#[derive(Debug)]
pub struct HiveClient {
    http: reqwest::Client,
    nodes: Vec<String>,
    chain_id: [u8; 32],
    next_id: AtomicU64,
}

impl HiveClient {
    /// Create a client for the given node URLs.
    pub fn new(nodes: Vec<String>, timeout: Duration) -> Result<Self, HiveError> {
        if nodes.is_empty() {
            return Err(HiveError::NoNodes);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HiveError::Transport {
                node: "client".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            nodes,
            chain_id: CHAIN_ID,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn with_chain_id(mut self, chain_id: [u8; 32]) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    async fn call_node(&self, node: &str, method: &str, params: &Value) -> Result<Value, HiveError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": format!("condenser_api.{method}"),
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });
        let transport = |source| HiveError::Transport {
            node: node.to_string(),
            source,
        };
        let res = self
            .http
            .post(node)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        let body: RpcResponse = res.json().await.map_err(transport)?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(HiveError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(HiveError::Decode(format!(
                "response to {method} has neither result nor error"
            ))),
        }
    }

    /// Tries each node in order. Read calls move on after any transport
    /// failure; broadcasts move on only when the request never reached the
    /// node, so a transaction is not submitted twice.
    async fn call_raw(&self, method: &str, params: Value, is_broadcast: bool) -> Result<Value, HiveError> {
        let mut last_error = None;
        for node in &self.nodes {
            debug!(node = %node, method, "Hive RPC call");
            match self.call_node(node, method, &params).await {
                Ok(result) => return Ok(result),
                Err(HiveError::Transport { node, source })
                    if !is_broadcast || source.is_connect() =>
                {
                    warn!(node = %node, method, error = %source, "Hive node failed, trying next");
                    last_error = Some(format!("{node}: {source}"));
                }
                Err(other) => return Err(other),
            }
        }
        Err(HiveError::Unavailable(
            last_error.unwrap_or_else(|| "no nodes tried".into()),
        ))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, HiveError> {
        let value = self.call_raw(method, params, false).await?;
        serde_json::from_value(value).map_err(|e| HiveError::Decode(format!("{method}: {e}")))
    }
}

#[async_trait]
impl HiveApi for HiveClient {
    async fn get_accounts(&self, names: &[String]) -> Result<Vec<Account>, HiveError> {
        self.call("get_accounts", json!([names])).await
    }

    async fn get_account_history(
        &self,
        account: &str,
        from: i64,
        limit: u32,
    ) -> Result<Vec<HistoryItem>, HiveError> {
        self.call("get_account_history", json!([account, from, limit]))
            .await
    }

    async fn get_vesting_delegations(
        &self,
        account: &str,
        from: &str,
        limit: u32,
    ) -> Result<Vec<VestingDelegation>, HiveError> {
        self.call("get_vesting_delegations", json!([account, from, limit]))
            .await
    }

    async fn get_content(&self, author: &str, permlink: &str) -> Result<Content, HiveError> {
        self.call("get_content", json!([author, permlink])).await
    }

    async fn get_discussions(
        &self,
        query: DiscussionQuery,
        tag: &str,
        limit: u32,
    ) -> Result<Vec<Content>, HiveError> {
        let method = format!("get_discussions_by_{}", query.as_str());
        self.call(&method, json!([{ "tag": tag, "limit": limit }]))
            .await
    }

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, HiveError> {
        self.call("get_dynamic_global_properties", json!([])).await
    }

    async fn get_chain_properties(&self) -> Result<Value, HiveError> {
        self.call("get_chain_properties", json!([])).await
    }

    async fn get_current_median_history_price(&self) -> Result<Price, HiveError> {
        self.call("get_current_median_history_price", json!([]))
            .await
    }

    async fn broadcast(
        &self,
        operations: Vec<Operation>,
        key: &PrivateKey,
    ) -> Result<TransactionConfirmation, HiveError> {
        let names: Vec<&'static str> = operations.iter().map(Operation::name).collect();
        let props = self.get_dynamic_global_properties().await?;
        let signed = Transaction::new(&props, operations, DEFAULT_EXPIRATION_SECS)?
            .sign(key, &self.chain_id)?;
        info!(operations = ?names, trx_id = %signed.id(), "Broadcasting transaction");

        let value = self
            .call_raw(
                "broadcast_transaction_synchronous",
                json!([signed.to_json()]),
                true,
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|e| HiveError::Decode(format!("broadcast_transaction_synchronous: {e}")))
    }
}
