//! Built-in local tools installed on every agent.
//!
//! There is currently one: `get_current_datetime`, a clock the model can call
//! when a question depends on today's date (earnings windows, "latest quarter",
//! and so on). It runs in-process through the same routing table as remote
//! tools, so the relay needs no special case for it.
//!
//! ```rust,ignore
//! use finagent::tools::{clock_declaration, clock_handler};
//!
//! let decl = clock_declaration();
//! assert_eq!(decl.name, "get_current_datetime");
//! let value = clock_handler()(serde_json::json!({}))?;
//! println!("{}", value["current_datetime"]);
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map};

use crate::finagent::tool_protocol::{DeclaredTool, LocalToolFn};

/// Name the clock tool is declared and routed under.
pub const CLOCK_TOOL_NAME: &str = "get_current_datetime";

/// Declaration for the built-in clock tool.
///
/// The parameter schema is an empty object; the tool takes no arguments.
pub fn clock_declaration() -> DeclaredTool {
    let mut parameters = Map::new();
    parameters.insert("type".to_string(), json!("object"));
    parameters.insert("properties".to_string(), json!({}));
    DeclaredTool::new(
        CLOCK_TOOL_NAME,
        "Returns the current date and time in a human-readable format.",
    )
    .with_parameters(parameters)
}

/// Handler for the built-in clock tool.
///
/// Ignores its arguments and returns `{"current_datetime": "<RFC 3339 UTC>"}`.
pub fn clock_handler() -> LocalToolFn {
    Arc::new(|_args| Ok(json!({ "current_datetime": Utc::now().to_rfc3339() })))
}
