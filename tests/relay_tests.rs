use async_trait::async_trait;
use finagent::client_wrapper::{AgentResponse, FunctionCall};
use finagent::relay::{relay, RelayError, RelayOutcome};
use finagent::tool_protocol::{
    DeclaredTool, RegisteredTool, RemoteCallResult, RemoteToolError, ToolDescriptor,
    ToolRegistry, ToolTransport,
};
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex};

/// Transport that records every call and answers with a fixed payload.
struct RecordingTransport {
    payload: JsonValue,
    calls: Mutex<Vec<(String, String, JsonValue)>>,
}

impl RecordingTransport {
    fn new(payload: JsonValue) -> Self {
        Self {
            payload,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, String, JsonValue)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolTransport for RecordingTransport {
    async fn list_tools(&self, _endpoint: &str) -> Result<Vec<ToolDescriptor>, RemoteToolError> {
        Ok(Vec::new())
    }

    async fn call_tool(
        &self,
        endpoint: &str,
        name: &str,
        args: &JsonValue,
    ) -> Result<RemoteCallResult, RemoteToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), name.to_string(), args.clone()));
        Ok(RemoteCallResult::new(self.payload.clone()))
    }
}

/// Transport whose tools always fail.
struct FailingTransport;

#[async_trait]
impl ToolTransport for FailingTransport {
    async fn list_tools(&self, _endpoint: &str) -> Result<Vec<ToolDescriptor>, RemoteToolError> {
        Ok(Vec::new())
    }

    async fn call_tool(
        &self,
        endpoint: &str,
        name: &str,
        _args: &JsonValue,
    ) -> Result<RemoteCallResult, RemoteToolError> {
        Err(RemoteToolError::tool_failure(endpoint, name, "unknown ticker"))
    }
}

fn remote_registry(name: &str, endpoint: &str) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(RegisteredTool::Remote {
        decl: DeclaredTool::new(name, "a catalog tool"),
        endpoint: endpoint.to_string(),
    });
    registry
}

fn call(name: &str, args: JsonValue) -> FunctionCall {
    FunctionCall {
        name: name.to_string(),
        args,
    }
}

#[tokio::test]
async fn test_text_responses_pass_through_without_any_dispatch() {
    let transport = RecordingTransport::new(json!("unused"));
    let registry = ToolRegistry::new();
    let response = AgentResponse::text("AAPL's gross margin is 45%.");

    let outcome = relay(&response, &registry, &transport).await.unwrap();
    assert_eq!(outcome.text(), "AAPL's gross margin is 45%.");
    assert!(matches!(outcome, RelayOutcome::Text(_)));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_empty_response_passes_through_as_empty_text() {
    let transport = RecordingTransport::new(json!("unused"));
    let registry = ToolRegistry::new();

    let outcome = relay(&AgentResponse::default(), &registry, &transport)
        .await
        .unwrap();
    assert_eq!(outcome.text(), "");
}

#[tokio::test]
async fn test_only_the_first_call_is_relayed() {
    let transport =
        RecordingTransport::new(json!([{ "type": "text", "text": "Market cap: $3.4T" }]));

    let mut registry = remote_registry("get_market_cap", "http://localhost:8000/mcp");
    registry.register(RegisteredTool::Remote {
        decl: DeclaredTool::new("get_stock_info", "a catalog tool"),
        endpoint: "http://localhost:8000/mcp".to_string(),
    });

    let response = AgentResponse::function_calls(vec![
        call("get_market_cap", json!({ "ticker": "AAPL" })),
        call("get_stock_info", json!({ "ticker": "MSFT" })),
    ]);

    let outcome = relay(&response, &registry, &transport).await.unwrap();
    assert_eq!(outcome.text(), "Market cap: $3.4T");

    // get_stock_info is registered but never invoked.
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "http://localhost:8000/mcp");
    assert_eq!(calls[0].1, "get_market_cap");
    assert_eq!(calls[0].2, json!({ "ticker": "AAPL" }));
}

#[tokio::test]
async fn test_model_text_is_discarded_when_a_call_is_present() {
    let transport = RecordingTransport::new(json!([{ "type": "text", "text": "45%" }]));
    let registry = remote_registry("get_gross_margins", "http://localhost:8000/mcp");

    let response = AgentResponse {
        text: Some("Let me look that up.".to_string()),
        function_calls: vec![call("get_gross_margins", json!({ "ticker": "AAPL" }))],
        usage: None,
    };

    let outcome = relay(&response, &registry, &transport).await.unwrap();
    // The tool result wins; the accompanying prose is not the answer.
    assert_eq!(outcome.text(), "45%");
    assert!(matches!(outcome, RelayOutcome::Tool(_)));
}

#[tokio::test]
async fn test_unknown_tool_is_a_routing_error() {
    let transport = RecordingTransport::new(json!("unused"));
    let registry = remote_registry("get_gross_margins", "http://localhost:8000/mcp");

    let response =
        AgentResponse::function_calls(vec![call("made_up_tool", json!({}))]);

    let err = relay(&response, &registry, &transport).await.unwrap_err();
    match err {
        RelayError::ToolRouting { tool } => assert_eq!(tool, "made_up_tool"),
        other => panic!("unexpected error: {}", other),
    }
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_local_tools_execute_in_process() {
    let transport = RecordingTransport::new(json!("unused"));

    let mut registry = ToolRegistry::new();
    registry.register(RegisteredTool::Local {
        decl: DeclaredTool::new("echo", "Echo the arguments back"),
        handler: Arc::new(|args| Ok(json!({ "echoed": args }))),
    });

    let response = AgentResponse::function_calls(vec![call("echo", json!({ "ticker": "TSLA" }))]);

    let outcome = relay(&response, &registry, &transport).await.unwrap();
    match outcome {
        RelayOutcome::Tool(result) => {
            assert_eq!(
                result.content(),
                &json!({ "echoed": { "ticker": "TSLA" } })
            );
        }
        other => panic!("unexpected outcome: {:?}", other.text()),
    }
    // The transport is never touched for a local tool.
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_local_handler_failures_are_reported_with_the_tool_name() {
    let transport = RecordingTransport::new(json!("unused"));

    let mut registry = ToolRegistry::new();
    registry.register(RegisteredTool::Local {
        decl: DeclaredTool::new("always_fails", "Fails on purpose"),
        handler: Arc::new(|_args| Err("ticker universe exhausted".into())),
    });

    let response = AgentResponse::function_calls(vec![call("always_fails", json!({}))]);

    let err = relay(&response, &registry, &transport).await.unwrap_err();
    match err {
        RelayError::LocalExecution { tool, message } => {
            assert_eq!(tool, "always_fails");
            assert_eq!(message, "ticker universe exhausted");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_remote_failures_pass_through_unchanged() {
    let registry = remote_registry("get_gross_margins", "http://localhost:8000/mcp");
    let response =
        AgentResponse::function_calls(vec![call("get_gross_margins", json!({ "ticker": "ZZZZ" }))]);

    let err = relay(&response, &registry, &FailingTransport).await.unwrap_err();
    match err {
        RelayError::Remote(RemoteToolError::ToolFailure { tool, message, .. }) => {
            assert_eq!(tool, "get_gross_margins");
            assert_eq!(message, "unknown ticker");
        }
        other => panic!("unexpected error: {}", other),
    }
}
