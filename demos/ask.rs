//! One-shot financial question against the configured tool catalogs.
//!
//! The simplest end-to-end pipeline: load the config, build an agent, import
//! every configured catalog, ask one question, relay the tool call the model
//! requests, print the result.
//!
//! ```bash
//! cargo run --example ask                  # reads env.toml
//! cargo run --example ask -- my-env.toml
//! ```

use std::env;
use std::sync::Arc;

use finagent::clients::gemini::{GeminiClient, Model};
use finagent::config::{AgentConfig, DEFAULT_CONFIG_PATH};
use finagent::relay::relay;
use finagent::{Agent, McpClientProtocol};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    finagent::init_logger();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AgentConfig::load(&config_path)?;

    let client = Arc::new(GeminiClient::new_with_model_enum(
        &config.google_api_key,
        Model::Gemini25Flash,
    ));
    let mcp = McpClientProtocol::new();

    let mut agent = Agent::new("main_agent", client);
    let registered = agent.register_catalogs_from_config(&mcp, &config).await?;
    println!(
        "Registered {} tool(s) from {} catalog(s)",
        registered,
        config.mcp_urls.len()
    );

    let query = "Give me the gross margins for Apple (AAPL)?";
    println!("User: {}", query);

    let response = agent.run(query).await?;
    let outcome = relay(&response, agent.registry(), &mcp).await?;
    println!("Agent: {}", outcome.text());

    Ok(())
}
