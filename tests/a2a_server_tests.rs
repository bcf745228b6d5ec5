#![cfg(feature = "a2a-server")]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use finagent::a2a_server::{
    build_app, AgentCard, AgentSkill, TaskServerState, A2A_USER_ID, AGENT_CARD_PATH,
};
use finagent::client_wrapper::{AgentResponse, ClientWrapper, GenerationError, Message};
use finagent::server_auth::AuthConfig;
use finagent::tool_protocol::{
    DeclaredTool, RemoteCallResult, RemoteToolError, ToolDescriptor, ToolTransport,
};
use finagent::{Agent, Runner};
use http_body_util::BodyExt;
use serde_json::{json, Value as JsonValue};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Client that replays a script of responses and records request sizes.
struct ScriptedClient {
    replies: Mutex<VecDeque<AgentResponse>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    fn new(replies: Vec<AgentResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn contents_of_call(&self, index: usize) -> Vec<Message> {
        self.seen.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ClientWrapper for ScriptedClient {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        _instruction: Option<&str>,
        contents: &[Message],
        _tools: &[DeclaredTool],
        _temperature: f32,
    ) -> Result<AgentResponse, GenerationError> {
        self.seen.lock().unwrap().push(contents.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::api("mock-model", 503, "model unavailable"))
    }
}

/// Transport for agents that never call remote tools in these tests.
struct NullTransport;

#[async_trait]
impl ToolTransport for NullTransport {
    async fn list_tools(&self, _endpoint: &str) -> Result<Vec<ToolDescriptor>, RemoteToolError> {
        Ok(Vec::new())
    }

    async fn call_tool(
        &self,
        endpoint: &str,
        _name: &str,
        _args: &JsonValue,
    ) -> Result<RemoteCallResult, RemoteToolError> {
        Err(RemoteToolError::protocol(endpoint, "call_tool not expected"))
    }
}

fn analyst_card() -> AgentCard {
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
        .with_examples(["Run technical analysis for stock TSLA"]),
    )
}

fn state_with(client: Arc<ScriptedClient>, auth: AuthConfig) -> (Arc<TaskServerState>, Runner) {
    let agent = Agent::new("technical_analyst_agent", client as Arc<dyn ClientWrapper>);
    let runner = Runner::new(Arc::new(agent), Arc::new(NullTransport));
    let state = Arc::new(TaskServerState {
        runner: runner.clone(),
        card: analyst_card(),
        auth,
    });
    (state, runner)
}

fn task_request(text: &str) -> Request<Body> {
    let body = json!({
        "message": {
            "role": "user",
            "parts": [{ "kind": "text", "text": text }]
        }
    });
    Request::builder()
        .method("POST")
        .uri("/tasks")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> JsonValue {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_agent_card_is_served_at_the_well_known_path() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let (state, _runner) = state_with(client, AuthConfig::None);

    let response = build_app(state)
        .oneshot(
            Request::builder()
                .uri(AGENT_CARD_PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let card = body_json(response).await;
    assert_eq!(card["name"], json!("Technical Analyst Agent"));
    assert_eq!(card["version"], json!("1.0.0"));
    assert_eq!(card["capabilities"]["streaming"], json!(false));
    assert_eq!(
        card["defaultInputModes"],
        json!(["text", "text/plain", "application/json"])
    );
    assert_eq!(
        card["defaultOutputModes"],
        json!(["text", "text/plain", "application/json"])
    );
    assert_eq!(card["skills"][0]["id"], json!("technical_stock_signals"));
    assert_eq!(
        card["skills"][0]["tags"],
        json!(["technical", "analysis", "bullish", "bearish"])
    );
    assert_eq!(
        card["skills"][0]["examples"][0],
        json!("Run technical analysis for stock TSLA")
    );
}

#[tokio::test]
async fn test_the_card_stays_public_when_auth_is_enabled() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let (state, _runner) = state_with(client, AuthConfig::bearer("secret-token"));

    let response = build_app(state)
        .oneshot(
            Request::builder()
                .uri(AGENT_CARD_PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_completed_tasks_carry_the_full_status_history_and_artifact() {
    let client = Arc::new(ScriptedClient::new(vec![AgentResponse::text(
        "TSLA is bullish.",
    )]));
    let (state, _runner) = state_with(client, AuthConfig::None);

    let response = build_app(state)
        .oneshot(task_request("Is TSLA bullish?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let task = body_json(response).await;
    assert!(task["id"].as_str().is_some_and(|id| !id.is_empty()));
    // With no contextId in the request, the task id doubles as the context.
    assert_eq!(task["contextId"], task["id"]);

    assert_eq!(task["status"]["state"], json!("completed"));
    let states: Vec<&str> = task["statusHistory"]
        .as_array()
        .unwrap()
        .iter()
        .map(|status| status["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["submitted", "working", "completed"]);
    assert_eq!(
        task["statusHistory"][1]["message"],
        json!("Processing request...")
    );
    assert!(task["statusHistory"][0]["timestamp"].is_string());

    assert_eq!(task["artifacts"][0]["name"], json!("response"));
    assert_eq!(task["artifacts"][0]["parts"][0]["kind"], json!("text"));
    assert_eq!(
        task["artifacts"][0]["parts"][0]["text"],
        json!("TSLA is bullish.")
    );
}

#[tokio::test]
async fn test_reusing_a_context_id_continues_the_conversation() {
    let client = Arc::new(ScriptedClient::new(vec![
        AgentResponse::text("TSLA is bullish."),
        AgentResponse::text("INTC is bearish."),
    ]));
    let (state, runner) = state_with(client.clone(), AuthConfig::None);

    let body = json!({
        "message": { "role": "user", "parts": [{ "kind": "text", "text": "Is TSLA bullish?" }] },
        "contextId": "ctx-7"
    });
    let request = |body: &JsonValue| {
        Request::builder()
            .method("POST")
            .uri("/tasks")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = build_app(Arc::clone(&state)).oneshot(request(&body)).await.unwrap();
    let task = body_json(response).await;
    assert_eq!(task["contextId"], json!("ctx-7"));

    let body = json!({
        "message": { "role": "user", "parts": [{ "kind": "text", "text": "And INTC?" }] },
        "contextId": "ctx-7"
    });
    build_app(state).oneshot(request(&body)).await.unwrap();

    // The second generation request carried the first exchange.
    let second_call = client.contents_of_call(1);
    assert_eq!(second_call.len(), 3);
    assert_eq!(second_call[2].content, "And INTC?");

    // The session is keyed by card name and the fixed a2a user.
    assert!(runner
        .store()
        .get("Technical Analyst Agent", A2A_USER_ID, "ctx-7")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_failed_turns_produce_a_failed_task() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let (state, _runner) = state_with(client, AuthConfig::None);

    let response = build_app(state)
        .oneshot(task_request("Is TSLA bullish?"))
        .await
        .unwrap();
    // Task failure is in-band state, not an HTTP error.
    assert_eq!(response.status(), StatusCode::OK);

    let task = body_json(response).await;
    assert_eq!(task["status"]["state"], json!("failed"));
    let message = task["status"]["message"].as_str().unwrap();
    assert!(message.starts_with("Error: "), "got: {}", message);
    assert!(message.contains("model unavailable"));
    assert!(task["artifacts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_messages_without_text_are_rejected() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let (state, _runner) = state_with(client, AuthConfig::None);

    let body = json!({ "message": { "role": "user", "parts": [] } });
    let response = build_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tasks")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert!(error["error"].is_string());
}

#[tokio::test]
async fn test_bearer_auth_guards_task_submission() {
    let client = Arc::new(ScriptedClient::new(vec![AgentResponse::text("ok")]));
    let (state, _runner) = state_with(client, AuthConfig::bearer("secret-token"));

    // No header at all.
    let response = build_app(Arc::clone(&state))
        .oneshot(task_request("hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token.
    let mut request = task_request("hello");
    request
        .headers_mut()
        .insert("authorization", "Bearer wrong-token".parse().unwrap());
    let response = build_app(Arc::clone(&state)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong scheme.
    let mut request = task_request("hello");
    request
        .headers_mut()
        .insert("authorization", "Basic secret-token".parse().unwrap());
    let response = build_app(Arc::clone(&state)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct token.
    let mut request = task_request("hello");
    request
        .headers_mut()
        .insert("authorization", "Bearer secret-token".parse().unwrap());
    let response = build_app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
