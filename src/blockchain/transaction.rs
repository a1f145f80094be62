// src/blockchain/transaction.rs

//! Transaction assembly, serialization and signing.

use chrono::{Duration, NaiveDateTime};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use super::encoding::Encoder;
use super::keys::{PrivateKey, Signature};
use super::models::{DynamicGlobalProperties, HiveError};
use super::operations::Operation;

/// Mainnet chain id.
pub const CHAIN_ID: [u8; 32] = [
    0xbe, 0xea, 0xb0, 0xde, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0,
];

/// Seconds until a freshly built transaction expires.
pub const DEFAULT_EXPIRATION_SECS: i64 = 60;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: NaiveDateTime,
    pub operations: Vec<Operation>,
}

impl Transaction {
    /// References the current head block and expires `expire_secs` after it.
    pub fn new(
        props: &DynamicGlobalProperties,
        operations: Vec<Operation>,
        expire_secs: i64,
    ) -> Result<Self, HiveError> {
        let block_id = hex::decode(&props.head_block_id)
            .map_err(|_| HiveError::ChainState(format!("bad head_block_id {}", props.head_block_id)))?;
        let prefix: [u8; 4] = block_id
            .get(4..8)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| HiveError::ChainState("head_block_id is too short".into()))?;
        let head_time = NaiveDateTime::parse_from_str(&props.time, TIME_FORMAT)
            .map_err(|_| HiveError::ChainState(format!("bad head block time {}", props.time)))?;

        Ok(Self {
            ref_block_num: (props.head_block_number & 0xffff) as u16,
            ref_block_prefix: u32::from_le_bytes(prefix),
            expiration: head_time + Duration::seconds(expire_secs),
            operations,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.u16(self.ref_block_num)
            .u32(self.ref_block_prefix)
            .u32(self.expiration.and_utc().timestamp() as u32)
            .varint(self.operations.len() as u32);
        for op in &self.operations {
            op.write_to(&mut enc);
        }
        // no extensions
        enc.varint(0);
        enc.into_bytes()
    }

    /// Hex of the first 20 bytes of `sha256(serialized)`.
    pub fn id(&self) -> String {
        let hash = Sha256::digest(self.serialize());
        hex::encode(&hash[..20])
    }

    /// `sha256(chain_id ‖ serialized)`, the value that gets signed.
    pub fn digest(&self, chain_id: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(chain_id);
        hasher.update(self.serialize());
        hasher.finalize().into()
    }

    pub fn sign(self, key: &PrivateKey, chain_id: &[u8; 32]) -> Result<SignedTransaction, HiveError> {
        let signature = key.sign(&self.digest(chain_id))?;
        Ok(SignedTransaction {
            transaction: self,
            signatures: vec![signature],
        })
    }

    fn json_fields(&self) -> Value {
        json!({
            "ref_block_num": self.ref_block_num,
            "ref_block_prefix": self.ref_block_prefix,
            "expiration": self.expiration.format(TIME_FORMAT).to_string(),
            "operations": self.operations.iter().map(Operation::to_json).collect::<Vec<_>>(),
            "extensions": [],
        })
    }
}

#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signatures: Vec<Signature>,
}

impl SignedTransaction {
    pub fn id(&self) -> String {
        self.transaction.id()
    }

    /// The form `broadcast_transaction_synchronous` accepts.
    pub fn to_json(&self) -> Value {
        let mut value = self.transaction.json_fields();
        value["signatures"] = self
            .signatures
            .iter()
            .map(|s| Value::String(s.to_string()))
            .collect();
        value
    }
}
