//! Technical-analyst agent served over the agent-to-agent task surface.
//!
//! Builds an agent restricted to the technical-analysis tools, wraps it in a
//! [`Runner`], and publishes it on `0.0.0.0:9999`. Peers fetch the card from
//! `/.well-known/agent.json` and submit work with `POST /tasks`.
//!
//! ```bash
//! cargo run --example a2a_server --features a2a-server
//! ```
//!
//! Then, from another terminal:
//!
//! ```bash
//! curl http://localhost:9999/.well-known/agent.json
//! curl -X POST http://localhost:9999/tasks \
//!   -H 'Content-Type: application/json' \
//!   -d '{"message": {"role": "user", "parts": [{"kind": "text", "text": "Is TSLA bullish?"}]}}'
//! ```

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use finagent::a2a_server::{AgentCard, AgentSkill, TaskServerBuilder};
use finagent::clients::gemini::{GeminiClient, Model};
use finagent::config::{AgentConfig, DEFAULT_CONFIG_PATH};
use finagent::{Agent, McpClientProtocol, Runner};

const INSTRUCTION: &str = "You are a financial analyst. \
    Use the tools provided to answer stock-related queries and perform technical analysis. \
    Use tabular format wherever possible.";

fn agent_card() -> AgentCard {
    AgentCard::new(
        "Technical Analyst Agent",
        "Main agent for stock screening based on technical indicators.",
        "http://localhost:9999/",
        "1.0.0",
    )
    .with_skill(
        AgentSkill::new(
            "technical_stock_signals",
            "Returns technical signals for a stock",
            "Performs technical analysis on a stock and provides its technical signals",
        )
        .with_tags(["technical", "analysis", "bullish", "bearish"])
        .with_examples([
            "Run technical analysis for stock TSLA",
            "Is the stock JNJ bullish or bearish right now?",
            "What are the technical signals like for INTL?",
        ]),
    )
    .with_skill(
        AgentSkill::new(
            "technical_stock_screener",
            "Returns bullish stocks",
            "Performs technical analysis on all stocks in a given list of stock ticker symbols, \
             and returns all bullish stocks from that list",
        )
        .with_tags(["technical", "analysis", "bullish", "bearish"])
        .with_examples(["Perform technical analysis on: TSLA, INTC, GOOGL, META."]),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    finagent::init_logger();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AgentConfig::load(&config_path)?;

    let client = Arc::new(GeminiClient::new_with_model_enum(
        &config.google_api_key,
        Model::Gemini25Flash,
    ));
    let mcp = Arc::new(McpClientProtocol::new());

    let mut agent = Agent::new("technical_analyst_agent", client)
        .with_instruction(INSTRUCTION)
        .with_tool_filter(["get_technical_signals", "screen_bullish_stocks"]);
    agent
        .register_catalogs_from_config(mcp.as_ref(), &config)
        .await?;

    let runner = Runner::new(Arc::new(agent), mcp);

    let addr: SocketAddr = "0.0.0.0:9999".parse()?;
    let server = TaskServerBuilder::new(runner, agent_card())
        .start_at(addr)
        .await?;
    println!("Technical analyst serving at {}", server.addr());

    // Serve until interrupted.
    tokio::signal::ctrl_c().await?;
    server.abort();
    println!("Shutting down.");

    Ok(())
}
