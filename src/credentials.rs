// src/credentials.rs

//! Hive account credentials sourced from the environment.
//!
//! Nothing here is cached: every call re-reads the environment, so keys added
//! or rotated while the server runs are picked up on the next request. Key
//! material is wrapped in [`SecretString`] and never logged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::keys::PrivateKey;

pub const USERNAME_VAR: &str = "HIVE_USERNAME";

/// Read access to environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Authority role a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    Posting,
    Active,
    Memo,
    Owner,
}

impl KeyRole {
    pub const ALL: [KeyRole; 4] = [KeyRole::Posting, KeyRole::Active, KeyRole::Memo, KeyRole::Owner];

    pub fn as_str(self) -> &'static str {
        match self {
            KeyRole::Posting => "posting",
            KeyRole::Active => "active",
            KeyRole::Memo => "memo",
            KeyRole::Owner => "owner",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            KeyRole::Posting => "HIVE_POSTING_KEY",
            KeyRole::Active => "HIVE_ACTIVE_KEY",
            KeyRole::Memo => "HIVE_MEMO_KEY",
            KeyRole::Owner => "HIVE_OWNER_KEY",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Names every variable that is unset.
    #[error("{}", missing_message(.0))]
    Missing(Vec<&'static str>),
    #[error("Error: Invalid {0} key format")]
    Malformed(KeyRole),
}

fn missing_message(vars: &[&'static str]) -> String {
    match vars {
        [single] => format!("Error: {single} environment variable is not set"),
        _ => format!("Error: {} environment variables are not set", vars.join(" and ")),
    }
}

/// Snapshot of the credential variables. Empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    pub username: Option<String>,
    pub posting_key: Option<SecretString>,
    pub active_key: Option<SecretString>,
    pub memo_key: Option<SecretString>,
    pub owner_key: Option<SecretString>,
}

impl CredentialSet {
    pub fn key(&self, role: KeyRole) -> Option<&SecretString> {
        match role {
            KeyRole::Posting => self.posting_key.as_ref(),
            KeyRole::Active => self.active_key.as_ref(),
            KeyRole::Memo => self.memo_key.as_ref(),
            KeyRole::Owner => self.owner_key.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    Missing,
    Invalid,
    Valid,
}

impl KeyState {
    fn of(key: Option<&SecretString>) -> Self {
        match key {
            None => KeyState::Missing,
            Some(k) if validate_key_format(Some(k.expose_secret().as_str())) => KeyState::Valid,
            Some(_) => KeyState::Invalid,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            KeyState::Missing => "not set",
            KeyState::Invalid => "set but invalid",
            KeyState::Valid => "set and valid",
        }
    }
}

/// Secret-free view of the credentials, safe to log or return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub username: Option<String>,
    pub posting: KeyState,
    pub active: KeyState,
    pub memo: KeyState,
    pub owner: KeyState,
}

impl CredentialStatus {
    pub fn state(&self, role: KeyRole) -> KeyState {
        match role {
            KeyRole::Posting => self.posting,
            KeyRole::Active => self.active,
            KeyRole::Memo => self.memo,
            KeyRole::Owner => self.owner,
        }
    }
}

/// True only when `key` is present and parses as a WIF private key.
pub fn validate_key_format(key: Option<&str>) -> bool {
    match key {
        Some(k) if !k.trim().is_empty() => PrivateKey::from_wif(k).is_ok(),
        _ => false,
    }
}

#[derive(Clone)]
pub struct CredentialResolver {
    source: Arc<dyn EnvSource>,
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

impl CredentialResolver {
    pub fn new(source: Arc<dyn EnvSource>) -> Self {
        Self { source }
    }

    pub fn from_process_env() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }

    fn read(&self, key: &str) -> Option<String> {
        self.source
            .var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn resolve(&self) -> CredentialSet {
        let secret = |role: KeyRole| self.read(role.env_var()).map(SecretString::new);
        CredentialSet {
            username: self.read(USERNAME_VAR),
            posting_key: secret(KeyRole::Posting),
            active_key: secret(KeyRole::Active),
            memo_key: secret(KeyRole::Memo),
            owner_key: secret(KeyRole::Owner),
        }
    }

    pub fn refresh(&self) -> CredentialStatus {
        let set = self.resolve();
        CredentialStatus {
            posting: KeyState::of(set.posting_key.as_ref()),
            active: KeyState::of(set.active_key.as_ref()),
            memo: KeyState::of(set.memo_key.as_ref()),
            owner: KeyState::of(set.owner_key.as_ref()),
            username: set.username,
        }
    }

    fn can_use(&self, role: KeyRole) -> bool {
        let set = self.resolve();
        set.username.is_some()
            && validate_key_format(set.key(role).map(|k| k.expose_secret().as_str()))
    }

    /// Username and a valid posting key are present.
    pub fn can_authenticate(&self) -> bool {
        self.can_use(KeyRole::Posting)
    }

    /// Username and a valid active key are present.
    pub fn can_transfer(&self) -> bool {
        self.can_use(KeyRole::Active)
    }

    pub fn username(&self) -> Option<String> {
        self.read(USERNAME_VAR)
    }

    /// The configured account together with its parsed `role` key.
    pub fn account_key(&self, role: KeyRole) -> Result<(String, PrivateKey), CredentialError> {
        let set = self.resolve();
        match (set.username.as_deref(), set.key(role)) {
            (Some(username), Some(key)) => Ok((username.to_string(), parse_key(key, role)?)),
            (None, Some(_)) => Err(CredentialError::Missing(vec![USERNAME_VAR])),
            (Some(_), None) => Err(CredentialError::Missing(vec![role.env_var()])),
            (None, None) => Err(CredentialError::Missing(vec![USERNAME_VAR, role.env_var()])),
        }
    }

    /// The parsed `role` key, without requiring a username.
    pub fn signing_key(&self, role: KeyRole) -> Result<PrivateKey, CredentialError> {
        let set = self.resolve();
        let key = set
            .key(role)
            .ok_or_else(|| CredentialError::Missing(vec![role.env_var()]))?;
        parse_key(key, role)
    }
}

fn parse_key(key: &SecretString, role: KeyRole) -> Result<PrivateKey, CredentialError> {
    PrivateKey::from_wif(key.expose_secret()).map_err(|_| CredentialError::Malformed(role))
}
