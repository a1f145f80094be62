//! Shared fixtures: an in-memory Hive node and state builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use hive_mcp_server::{
    blockchain::{
        models::{
            Account, Content, DiscussionQuery, DynamicGlobalProperties, HistoryEntry, HistoryItem,
            Price, TransactionConfirmation, VestingDelegation,
        },
        operations::Operation,
        HiveApi, HiveError, PrivateKey,
    },
    config::Config,
    credentials::CredentialResolver,
    mcp::response::ToolResponse,
    AppState,
};

pub const TRX_ID: &str = "0123456789abcdef0123456789abcdef01234567";

/// Canned chain data plus a log of everything broadcast.
#[derive(Default)]
pub struct MockHive {
    pub accounts: Vec<Account>,
    pub history: Vec<HistoryItem>,
    pub delegations: Vec<VestingDelegation>,
    pub content: HashMap<(String, String), Content>,
    pub discussions: Vec<Content>,
    /// Every read fails with this RPC message when set.
    pub fail_reads: Option<String>,
    pub broadcasts: Mutex<Vec<Vec<Operation>>>,
    pub discussion_queries: Mutex<Vec<(DiscussionQuery, String, u32)>>,
}

impl MockHive {
    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    pub fn last_broadcast(&self) -> Vec<Operation> {
        self.broadcasts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn check(&self) -> Result<(), HiveError> {
        match &self.fail_reads {
            Some(message) => Err(HiveError::Rpc {
                code: -32000,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl HiveApi for MockHive {
    async fn get_accounts(&self, names: &[String]) -> Result<Vec<Account>, HiveError> {
        self.check()?;
        Ok(self
            .accounts
            .iter()
            .filter(|a| names.contains(&a.name))
            .cloned()
            .collect())
    }

    async fn get_account_history(
        &self,
        _account: &str,
        _from: i64,
        limit: u32,
    ) -> Result<Vec<HistoryItem>, HiveError> {
        self.check()?;
        let skip = self.history.len().saturating_sub(limit as usize);
        Ok(self.history[skip..].to_vec())
    }

    async fn get_vesting_delegations(
        &self,
        _account: &str,
        _from: &str,
        limit: u32,
    ) -> Result<Vec<VestingDelegation>, HiveError> {
        self.check()?;
        Ok(self.delegations.iter().take(limit as usize).cloned().collect())
    }

    async fn get_content(&self, author: &str, permlink: &str) -> Result<Content, HiveError> {
        self.check()?;
        Ok(self
            .content
            .get(&(author.to_string(), permlink.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_discussions(
        &self,
        query: DiscussionQuery,
        tag: &str,
        limit: u32,
    ) -> Result<Vec<Content>, HiveError> {
        self.check()?;
        self.discussion_queries
            .lock()
            .unwrap()
            .push((query, tag.to_string(), limit));
        Ok(self.discussions.iter().take(limit as usize).cloned().collect())
    }

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, HiveError> {
        self.check()?;
        Ok(DynamicGlobalProperties {
            head_block_number: 90_000_000,
            head_block_id: "055f4a80aabbccddeeff00112233445566778899".into(),
            time: "2024-01-01T00:00:00".into(),
            extra: Map::new(),
        })
    }

    async fn get_chain_properties(&self) -> Result<Value, HiveError> {
        self.check()?;
        Ok(serde_json::json!({ "account_creation_fee": "3.000 HIVE" }))
    }

    async fn get_current_median_history_price(&self) -> Result<Price, HiveError> {
        self.check()?;
        Ok(Price {
            base: "0.250 HBD".into(),
            quote: "1.000 HIVE".into(),
        })
    }

    async fn broadcast(
        &self,
        operations: Vec<Operation>,
        _key: &PrivateKey,
    ) -> Result<TransactionConfirmation, HiveError> {
        self.broadcasts.lock().unwrap().push(operations);
        Ok(TransactionConfirmation {
            id: TRX_ID.into(),
            block_num: 90_000_001,
            trx_num: 3,
            expired: false,
        })
    }
}

/// Deterministic key for `label`.
pub fn key(label: &str) -> PrivateKey {
    PrivateKey::from_seed(label).unwrap()
}

pub fn wif(label: &str) -> String {
    key(label).to_wif()
}

pub fn account(name: &str, memo: &PrivateKey) -> Account {
    Account {
        name: name.to_string(),
        memo_key: memo.public_key().to_string(),
        extra: Map::new(),
    }
}

pub fn history_entry(index: u64, op_type: &str, body: Value) -> HistoryItem {
    (
        index,
        HistoryEntry {
            trx_id: format!("trx{index}"),
            block: 1000 + index,
            timestamp: "2024-01-01T00:00:00".into(),
            op: (op_type.to_string(), body),
        },
    )
}

/// Variables for `alice` with every key set.
pub fn alice_env() -> Vec<(&'static str, String)> {
    vec![
        ("HIVE_USERNAME", "alice".to_string()),
        ("HIVE_POSTING_KEY", wif("alice-posting")),
        ("HIVE_ACTIVE_KEY", wif("alice-active")),
        ("HIVE_MEMO_KEY", wif("alice-memo")),
    ]
}

pub fn state_with(hive: Arc<MockHive>, env: Vec<(&'static str, String)>) -> AppState {
    let vars: HashMap<String, String> = env
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    AppState::new(
        Config::default(),
        hive,
        CredentialResolver::new(Arc::new(vars)),
    )
    .unwrap()
}

/// Calls `tool` and expects the arguments to pass validation.
pub async fn call(state: &AppState, tool: &str, args: Value) -> ToolResponse {
    state
        .tools
        .get(tool)
        .unwrap_or_else(|| panic!("tool {tool} is not registered"))
        .call(state.clone(), args)
        .await
        .unwrap_or_else(|failure| panic!("arguments rejected: {failure:?}"))
}

/// Parses the JSON payload of a successful response.
pub fn payload(response: &ToolResponse) -> Value {
    assert!(!response.is_error, "unexpected error: {}", response.text());
    serde_json::from_str(response.text()).unwrap()
}
