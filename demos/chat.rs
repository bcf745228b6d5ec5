//! Interactive stock-screening conversation.
//!
//! Drives a [`Runner`] session from stdin. The same `(app, user, session)` key
//! is reused on every line, so the agent sees the whole conversation. Type
//! `quit` or `exit` to leave.
//!
//! ```bash
//! cargo run --example chat
//! ```

use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use finagent::clients::gemini::{GeminiClient, Model};
use finagent::config::{AgentConfig, DEFAULT_CONFIG_PATH};
use finagent::{Agent, McpClientProtocol, Runner};

const APP_NAME: &str = "StockScreener";
const USER_ID: &str = "user";
const SESSION_ID: &str = "interactive";

const INSTRUCTION: &str = "You are a financial assistant. \
    Use the tools provided to answer stock-related queries. Use tabular format wherever possible. \
    Recommend stock when asked, and let the user know that the advice is for educational purposes only.";

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
    let mcp = Arc::new(McpClientProtocol::new());

    let mut agent = Agent::new("stock_screener_agent", client)
        .with_instruction(INSTRUCTION)
        .with_tool_filter([
            "get_gross_margins",
            "screen_stocks",
            "get_market_cap",
            "get_ticker_financials",
            "get_stock_info",
        ]);
    agent
        .register_catalogs_from_config(mcp.as_ref(), &config)
        .await?;

    let runner = Runner::new(Arc::new(agent), mcp);

    println!("Agent: How may I help you today?");

    loop {
        print!("User: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Exiting the session.");
            break;
        }

        let outcome = runner.ask(APP_NAME, USER_ID, SESSION_ID, input).await?;
        println!("Agent: {}", outcome);
    }

    Ok(())
}
