// src/config.rs

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

use crate::blockchain::{client::DEFAULT_NODES, transaction::CHAIN_ID};
use crate::credentials::{EnvSource, ProcessEnv};

/// How the server talks to its MCP client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// Line-delimited JSON-RPC on stdin/stdout.
    Stdio,
    /// axum server exposing `/api/rpc` and `/api/health`.
    Http,
}

// A struct to hold all configuration, loaded once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub server_name: String,
    pub server_version: String,
    pub transport: Transport,
    pub port: u16,
    pub log_level: String,

    /// Hive API nodes, tried in order.
    pub api_nodes: Vec<String>,
    pub chain_id: [u8; 32],
    pub rpc_timeout: Duration,

    // Links and metadata written into responses and posts
    pub frontend_url: String,
    pub explorer_url: String,
    pub app_name: String,
}

impl Default for Config {
    fn default() -> Self {
        let version = env!("CARGO_PKG_VERSION").to_string();
        Self {
            server_name: "hive-mcp-server".to_string(),
            app_name: format!("hive-mcp-server/{version}"),
            server_version: version,
            transport: Transport::Stdio,
            port: 8080,
            log_level: "info".to_string(),
            api_nodes: DEFAULT_NODES.iter().map(|n| n.to_string()).collect(),
            chain_id: CHAIN_ID,
            rpc_timeout: Duration::from_secs(30),
            frontend_url: "https://hive.blog".to_string(),
            explorer_url: "https://www.hiveblockexplorer.com".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment, after `.env`.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        Self::from_source(&ProcessEnv)
    }

    /// Builds the configuration from any variable source; unset variables
    /// keep their defaults.
    pub fn from_source(env: &dyn EnvSource) -> Result<Self> {
        let mut config = Config::default();
        let var = |key: &str| env.var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = var("PORT") {
            config.port = port.parse().context("PORT must be a valid number")?;
        }

        if let Some(level) = var("LOG_LEVEL") {
            let level = level.to_lowercase();
            if !matches!(level.as_str(), "debug" | "info" | "warn" | "error") {
                bail!("LOG_LEVEL must be one of debug, info, warn, error (got '{level}')");
            }
            config.log_level = level;
        }

        if let Some(transport) = var("MCP_TRANSPORT") {
            config.transport = match transport.to_lowercase().as_str() {
                "stdio" => Transport::Stdio,
                "http" => Transport::Http,
                other => bail!("MCP_TRANSPORT must be 'stdio' or 'http' (got '{other}')"),
            };
        }

        if let Some(nodes) = var("HIVE_API_NODES") {
            config.api_nodes = parse_nodes(&nodes)?;
        }

        if let Some(chain_id) = var("HIVE_CHAIN_ID") {
            config.chain_id = hex::decode(&chain_id)
                .ok()
                .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
                .ok_or_else(|| anyhow!("HIVE_CHAIN_ID must be 64 hex characters"))?;
        }

        if let Some(timeout) = var("HIVE_RPC_TIMEOUT_SECS") {
            let secs: u64 = timeout
                .parse()
                .context("HIVE_RPC_TIMEOUT_SECS must be a whole number of seconds")?;
            if secs == 0 {
                bail!("HIVE_RPC_TIMEOUT_SECS must be greater than zero");
            }
            config.rpc_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn post_url(&self, author: &str, permlink: &str) -> String {
        format!("{}/@{}/{}", self.frontend_url, author, permlink)
    }

    pub fn transaction_url(&self, trx_id: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, trx_id)
    }
}

fn parse_nodes(raw: &str) -> Result<Vec<String>> {
    let nodes = raw
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| -> Result<String> {
            let url = Url::parse(n).with_context(|| format!("invalid Hive API node URL '{n}'"))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Hive API node '{n}' must use http or https");
            }
            Ok(n.trim_end_matches('/').to_string())
        })
        .collect::<Result<Vec<_>>>()?;
    if nodes.is_empty() {
        bail!("HIVE_API_NODES must list at least one node");
    }
    Ok(nodes)
}
