#![recursion_limit = "256"]
// src/lib.rs

use std::sync::Arc;

pub mod api;
pub mod blockchain;
pub mod config;
pub mod credentials;
pub mod mcp;
pub mod tools;
pub mod utils;

use blockchain::HiveApi;
use config::Config;
use credentials::CredentialResolver;
use mcp::registry::{RegistryError, ToolRegistry};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Hive node access
    pub hive: Arc<dyn HiveApi>,
    /// Reads account keys from the environment on demand
    pub credentials: CredentialResolver,
    /// Every tool the server exposes
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    /// Builds the state with the full tool set registered.
    pub fn new(
        config: Config,
        hive: Arc<dyn HiveApi>,
        credentials: CredentialResolver,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            config: Arc::new(config),
            hive,
            credentials,
            tools: Arc::new(tools::registry()?),
        })
    }
}
