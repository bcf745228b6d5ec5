//! Google Gemini client speaking the native `generateContent` REST API.
//!
//! The native endpoint is used rather than an OpenAI-compatible facade because
//! the pipeline needs the structured `functionCall` parts of the response; the
//! compatibility surface flattens those away. Nothing here executes a tool:
//! requested calls are decoded into
//! [`AgentResponse::function_calls`](crate::client_wrapper::AgentResponse) and
//! handed back to the caller.

use crate::finagent::client_wrapper::{
    AgentResponse, ClientWrapper, FunctionCall, GenerationError, Message, Role, TokenUsage,
};
use crate::finagent::tool_protocol::DeclaredTool;
use async_trait::async_trait;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Generation models currently served by the API.
pub enum Model {
    Gemini25Pro,
    Gemini25Flash,
    Gemini25FlashLite,
    Gemini20Flash,
    Gemini20FlashLite,
}

pub fn model_to_string(model: Model) -> String {
    match model {
        Model::Gemini25Pro => "gemini-2.5-pro".to_string(),
        Model::Gemini25Flash => "gemini-2.5-flash".to_string(),
        Model::Gemini25FlashLite => "gemini-2.5-flash-lite".to_string(),
        Model::Gemini20Flash => "gemini-2.0-flash".to_string(),
        Model::Gemini20FlashLite => "gemini-2.0-flash-lite".to_string(),
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    pub model: String,
    token_usage: Mutex<Option<TokenUsage>>,
}

impl GeminiClient {
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Point the client at a non-default API host (proxies, test servers).
    /// The default base URL is `<https://generativelanguage.googleapis.com/v1beta/>`.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        GeminiClient {
            http: build_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            api_key: secret_key.to_string(),
            base_url: base_url.to_string(),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    /// Override the request deadline for subsequent generation calls.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http = build_http_client(Duration::from_secs(timeout_secs));
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

fn wire_role(role: Role) -> &'static str {
    match role {
        // The API only knows "user" and "model"; system text travels in
        // systemInstruction, never in contents.
        Role::System | Role::User => "user",
        Role::Assistant => "model",
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireToolList<'a>>>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireToolList<'a> {
    function_declarations: &'a [DeclaredTool],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: JsonValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    usage_metadata: Option<WireUsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireUsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

fn text_part(text: impl Into<String>) -> WirePart {
    WirePart {
        text: Some(text.into()),
        ..WirePart::default()
    }
}

/// Map a decoded response body to the crate's response union.
fn decode_response(
    model: &str,
    body: GenerateContentResponse,
) -> Result<AgentResponse, GenerationError> {
    let usage = body.usage_metadata.map(|u| TokenUsage {
        input_tokens: u.prompt_token_count,
        output_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::malformed(model, "response carries no candidates"))?;

    let mut text = String::new();
    let mut saw_text = false;
    let mut function_calls = Vec::new();

    if let Some(content) = candidate.content {
        for part in content.parts {
            if let Some(t) = part.text {
                text.push_str(&t);
                saw_text = true;
            }
            if let Some(call) = part.function_call {
                let args = if call.args.is_null() {
                    serde_json::json!({})
                } else {
                    call.args
                };
                function_calls.push(FunctionCall {
                    name: call.name,
                    args,
                });
            }
        }
    }

    Ok(AgentResponse {
        text: if saw_text { Some(text) } else { None },
        function_calls,
        usage,
    })
}

#[async_trait]
impl ClientWrapper for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        instruction: Option<&str>,
        contents: &[Message],
        tools: &[DeclaredTool],
        temperature: f32,
    ) -> Result<AgentResponse, GenerationError> {
        let request = GenerateContentRequest {
            system_instruction: instruction.map(|text| WireContent {
                role: None,
                parts: vec![text_part(text)],
            }),
            contents: contents
                .iter()
                .map(|msg| WireContent {
                    role: Some(wire_role(msg.role).to_string()),
                    parts: vec![text_part(msg.content.clone())],
                })
                .collect(),
            tools: if tools.is_empty() {
                None
            } else {
                Some(vec![WireToolList {
                    function_declarations: tools,
                }])
            },
            generation_config: WireGenerationConfig { temperature },
        };

        let response = self
            .http
            .post(self.request_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if log::log_enabled!(log::Level::Error) {
                    error!("GeminiClient::generate transport error: {}", e);
                }
                GenerationError::transport(&self.model, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if log::log_enabled!(log::Level::Error) {
                error!("GeminiClient::generate API error {}: {}", status, message);
            }
            return Err(GenerationError::api(&self.model, status.as_u16(), message));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::malformed(&self.model, e.to_string()))?;

        let decoded = decode_response(&self.model, body)?;

        if let Ok(mut slot) = self.token_usage.lock() {
            *slot = decoded.usage.clone();
        }

        Ok(decoded)
    }

    /// Token usage for the last request; without this override there would be
    /// no tracking available, because the default `usage_slot()` returns None.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
