//! Tool Transport Implementations
//!
//! Concrete [`ToolTransport`] implementations. The only shipped transport is
//! [`McpClientProtocol`], which speaks the MCP-style JSON-RPC 2.0 dialect over
//! HTTP POST: method `tools/list` to fetch a catalog and method `tools/call`
//! with `{name, arguments}` params to invoke a tool.
//!
//! Connections are scoped to a single invocation and every request carries a
//! deadline, so a hung endpoint surfaces as a transport error instead of
//! stalling the caller.
//!
//! ```rust,no_run
//! use finagent::tool_protocol::ToolTransport;
//! use finagent::tool_protocols::McpClientProtocol;
//!
//! # async {
//! let transport = McpClientProtocol::new().with_timeout(10);
//! let catalog = transport.list_tools("http://localhost:8000/mcp").await?;
//! # Ok::<(), finagent::tool_protocol::RemoteToolError>(())
//! # };
//! ```

use crate::finagent::tool_protocol::{
    RemoteCallResult, RemoteToolError, ToolDescriptor, ToolTransport,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<JsonValue>,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<JsonRpcErrorBody>,
}

#[derive(Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC client for MCP-style tool endpoints.
///
/// One instance can serve any number of endpoints; the endpoint URL is an
/// argument on every call, matching the opaque-RPC-stub contract of
/// [`ToolTransport`].
pub struct McpClientProtocol {
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl McpClientProtocol {
    /// Create a transport with the default 30 second request deadline.
    pub fn new() -> Self {
        Self::with_timeout_duration(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Override the request deadline for subsequent HTTP calls.
    pub fn with_timeout(self, timeout_secs: u64) -> Self {
        Self::with_timeout_duration(Duration::from_secs(timeout_secs))
    }

    fn with_timeout_duration(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                // Connections are scoped to one invocation; none survive
                // between calls.
                .pool_max_idle_per_host(0)
                .build()
                .expect("Failed to build HTTP client"),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(
        &self,
        endpoint: &str,
        method: &str,
        params: Option<JsonValue>,
    ) -> Result<JsonValue, RemoteToolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        log::debug!("{} <- {} (id {})", endpoint, method, id);

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RemoteToolError::transport(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteToolError::protocol(
                endpoint,
                format!("endpoint returned status {}", status),
            ));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RemoteToolError::transport(endpoint, e))?;

        if let Some(err) = body.error {
            return Err(RemoteToolError::protocol(
                endpoint,
                format!("{} (code {})", err.message, err.code),
            ));
        }

        body.result.ok_or_else(|| {
            RemoteToolError::protocol(endpoint, "response carries neither result nor error")
        })
    }
}

impl Default for McpClientProtocol {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_catalog(
    endpoint: &str,
    result: JsonValue,
) -> Result<Vec<ToolDescriptor>, RemoteToolError> {
    let tools = result
        .get("tools")
        .cloned()
        .ok_or_else(|| RemoteToolError::protocol(endpoint, "catalog response has no 'tools' field"))?;

    serde_json::from_value(tools)
        .map_err(|e| RemoteToolError::protocol(endpoint, format!("undecodable tool catalog: {}", e)))
}

fn decode_call_result(
    endpoint: &str,
    tool: &str,
    result: JsonValue,
) -> Result<RemoteCallResult, RemoteToolError> {
    let is_error = result
        .get("isError")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    // Standard results wrap the payload in a `content` list; tolerate servers
    // that return the payload bare.
    let content = match result.get("content") {
        Some(c) => c.clone(),
        None => result,
    };

    if is_error {
        let message = RemoteCallResult::new(content).text();
        return Err(RemoteToolError::tool_failure(endpoint, tool, message));
    }

    Ok(RemoteCallResult::new(content))
}

#[async_trait]
impl ToolTransport for McpClientProtocol {
    async fn list_tools(&self, endpoint: &str) -> Result<Vec<ToolDescriptor>, RemoteToolError> {
        let result = self.call(endpoint, "tools/list", None).await?;
        let descriptors = decode_catalog(endpoint, result)?;

        let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
        log::info!(
            "{}: catalog lists {} tool(s): [{}]",
            endpoint,
            descriptors.len(),
            names.join(", ")
        );

        Ok(descriptors)
    }

    async fn call_tool(
        &self,
        endpoint: &str,
        name: &str,
        args: &JsonValue,
    ) -> Result<RemoteCallResult, RemoteToolError> {
        let params = serde_json::json!({
            "name": name,
            "arguments": args,
        });

        let result = self.call(endpoint, "tools/call", Some(params)).await?;
        decode_call_result(endpoint, name, result)
    }
}
