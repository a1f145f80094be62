// src/tools/chain.rs

use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::mcp::registry::{ToolDescriptor, ToolError, ToolOutput};
use crate::AppState;

/// Takes no arguments.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct GetChainPropertiesParams {}

pub(crate) fn tools() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor::new(
        "get_chain_properties",
        "Fetch current Hive blockchain properties and statistics",
        get_chain_properties,
    )]
}

pub async fn get_chain_properties(
    state: AppState,
    _params: GetChainPropertiesParams,
) -> Result<ToolOutput, ToolError> {
    let dynamic = state.hive.get_dynamic_global_properties().await?;
    let chain = state.hive.get_chain_properties().await?;
    let price = state.hive.get_current_median_history_price().await?;

    Ok(ToolOutput::Json(json!({
        "dynamic_properties": dynamic,
        "chain_properties": chain,
        "current_median_history_price": {
            "base": price.base,
            "quote": price.quote,
        },
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}
