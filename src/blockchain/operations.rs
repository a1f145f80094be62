// src/blockchain/operations.rs

//! The broadcastable operations and their JSON and binary forms.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use thiserror::Error;

use super::encoding::Encoder;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssetError {
    #[error("invalid asset '{0}': expected '<amount> <symbol>'")]
    Format(String),
    #[error("unknown asset symbol '{0}'")]
    Symbol(String),
    #[error("invalid asset amount '{0}'")]
    Amount(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AssetSymbol {
    #[serde(rename = "HIVE")]
    Hive,
    #[serde(rename = "HBD")]
    Hbd,
}

impl AssetSymbol {
    pub const PRECISION: u8 = 3;

    pub fn as_str(self) -> &'static str {
        match self {
            AssetSymbol::Hive => "HIVE",
            AssetSymbol::Hbd => "HBD",
        }
    }

    /// Name used in the binary serialization, which predates the rebrand.
    fn legacy_name(self) -> &'static str {
        match self {
            AssetSymbol::Hive => "STEEM",
            AssetSymbol::Hbd => "SBD",
        }
    }
}

impl FromStr for AssetSymbol {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIVE" | "STEEM" => Ok(AssetSymbol::Hive),
            "HBD" | "SBD" => Ok(AssetSymbol::Hbd),
            other => Err(AssetError::Symbol(other.to_string())),
        }
    }
}

/// A HIVE or HBD amount held in thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub amount: i64,
    pub symbol: AssetSymbol,
}

impl Asset {
    /// Rounds `amount` to three decimals.
    pub fn from_amount(amount: f64, symbol: AssetSymbol) -> Self {
        Self {
            amount: (amount * 1000.0).round() as i64,
            symbol,
        }
    }

    fn write_to(&self, enc: &mut Encoder) {
        let mut name = [0u8; 7];
        let legacy = self.symbol.legacy_name().as_bytes();
        name[..legacy.len()].copy_from_slice(legacy);
        enc.i64(self.amount)
            .u8(AssetSymbol::PRECISION)
            .raw(&name);
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:03} {}",
            abs / 1000,
            abs % 1000,
            self.symbol.as_str()
        )
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(number), Some(symbol), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AssetError::Format(s.to_string()));
        };
        let symbol: AssetSymbol = symbol.parse()?;

        let bad_amount = || AssetError::Amount(number.to_string());
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty()
            || fraction.len() > usize::from(AssetSymbol::PRECISION)
            || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
        {
            return Err(bad_amount());
        }
        let whole: i64 = whole.parse().map_err(|_| bad_amount())?;
        let fraction: i64 = format!("{fraction:0<3}").parse().map_err(|_| bad_amount())?;
        let amount = whole
            .checked_mul(1000)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(bad_amount)?;

        Ok(Self {
            amount: if negative { -amount } else { amount },
            symbol,
        })
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub account: String,
    pub weight: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteOperation {
    pub voter: String,
    pub author: String,
    pub permlink: String,
    pub weight: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentOperation {
    pub parent_author: String,
    pub parent_permlink: String,
    pub author: String,
    pub permlink: String,
    pub title: String,
    pub body: String,
    pub json_metadata: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferOperation {
    pub from: String,
    pub to: String,
    pub amount: Asset,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentOptionsOperation {
    pub author: String,
    pub permlink: String,
    pub max_accepted_payout: Asset,
    pub percent_hbd: u16,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
    pub beneficiaries: Vec<Beneficiary>,
}

impl CommentOptionsOperation {
    fn to_json(&self) -> Value {
        let extensions = if self.beneficiaries.is_empty() {
            json!([])
        } else {
            json!([[0, { "beneficiaries": self.beneficiaries }]])
        };
        json!({
            "author": self.author,
            "permlink": self.permlink,
            "max_accepted_payout": self.max_accepted_payout.to_string(),
            "percent_hbd": self.percent_hbd,
            "allow_votes": self.allow_votes,
            "allow_curation_rewards": self.allow_curation_rewards,
            "extensions": extensions,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Vote(VoteOperation),
    Comment(CommentOperation),
    Transfer(TransferOperation),
    CommentOptions(CommentOptionsOperation),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Vote(_) => "vote",
            Operation::Comment(_) => "comment",
            Operation::Transfer(_) => "transfer",
            Operation::CommentOptions(_) => "comment_options",
        }
    }

    /// Position of the operation in the chain's operation variant.
    pub fn id(&self) -> u32 {
        match self {
            Operation::Vote(_) => 0,
            Operation::Comment(_) => 1,
            Operation::Transfer(_) => 2,
            Operation::CommentOptions(_) => 19,
        }
    }

    /// `[name, body]`, the condenser_api form.
    pub fn to_json(&self) -> Value {
        let body = match self {
            Operation::Vote(op) => json!(op),
            Operation::Comment(op) => json!(op),
            Operation::Transfer(op) => json!(op),
            Operation::CommentOptions(op) => op.to_json(),
        };
        json!([self.name(), body])
    }

    pub fn write_to(&self, enc: &mut Encoder) {
        enc.varint(self.id());
        match self {
            Operation::Vote(op) => {
                enc.string(&op.voter)
                    .string(&op.author)
                    .string(&op.permlink)
                    .i16(op.weight);
            }
            Operation::Comment(op) => {
                enc.string(&op.parent_author)
                    .string(&op.parent_permlink)
                    .string(&op.author)
                    .string(&op.permlink)
                    .string(&op.title)
                    .string(&op.body)
                    .string(&op.json_metadata);
            }
            Operation::Transfer(op) => {
                enc.string(&op.from).string(&op.to);
                op.amount.write_to(enc);
                enc.string(&op.memo);
            }
            Operation::CommentOptions(op) => {
                enc.string(&op.author).string(&op.permlink);
                op.max_accepted_payout.write_to(enc);
                enc.u16(op.percent_hbd)
                    .bool(op.allow_votes)
                    .bool(op.allow_curation_rewards);
                if op.beneficiaries.is_empty() {
                    enc.varint(0);
                } else {
                    // one extension: comment_payout_beneficiaries (variant 0)
                    enc.varint(1)
                        .varint(0)
                        .varint(op.beneficiaries.len() as u32);
                    for b in &op.beneficiaries {
                        enc.string(&b.account).u16(b.weight);
                    }
                }
            }
        }
    }
}
