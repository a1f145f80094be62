// src/main.rs

use std::sync::Arc;

use anyhow::Context;
use hive_mcp_server::{
    api::run_http_server,
    blockchain::HiveClient,
    config::{Config, Transport},
    credentials::{CredentialResolver, KeyRole, KeyState},
    mcp::stdio::run_stdio,
    AppState,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(level: &str) {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hive_mcp_server={level},hive_mcp={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Logs which credentials are usable, never their values.
fn report_credentials(credentials: &CredentialResolver) {
    let status = credentials.refresh();
    match &status.username {
        Some(name) => info!("Using Hive account: {}", name),
        None => warn!("HIVE_USERNAME environment variable is not set"),
    }

    for role in KeyRole::ALL {
        let var = role.env_var();
        match status.state(role) {
            KeyState::Valid => info!("{} is set and valid", var),
            KeyState::Invalid => warn!("{} is set but is not a valid private key", var),
            KeyState::Missing => match role {
                KeyRole::Owner => debug!("{} is not set", var),
                KeyRole::Active => {
                    warn!("{} environment variable is not set (required for token transfers)", var)
                }
                _ => warn!("{} environment variable is not set", var),
            },
        }
    }
}

fn transport_override() -> Option<Transport> {
    std::env::args().skip(1).find_map(|arg| match arg.as_str() {
        "--http" => Some(Transport::Http),
        "--stdio" | "--mcp" => Some(Transport::Stdio),
        _ => None,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    let credentials = CredentialResolver::from_process_env();
    report_credentials(&credentials);

    let hive = HiveClient::new(config.api_nodes.clone(), config.rpc_timeout)
        .context("Failed to initialize Hive client")?
        .with_chain_id(config.chain_id);
    info!("Using Hive API nodes: {}", hive.nodes().join(", "));

    let transport = transport_override().unwrap_or(config.transport);
    let state = AppState::new(config, Arc::new(hive), credentials)
        .context("Failed to register tools")?;
    info!("Registered {} tools", state.tools.len());

    match transport {
        Transport::Stdio => run_stdio(state).await.context("MCP stdio server failed"),
        Transport::Http => run_http_server(state).await,
    }
}
