//! Native Google Gemini provider (`generateContent`).
//!
//! The API key travels in the `x-goog-api-key` header so it never appears in
//! request URLs or in transport error messages that quote them.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use sheetwise_core::error::ProviderError;
use sheetwise_core::message::{Message, MessageToolCall, Role};
use sheetwise_core::provider::*;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{http_client, transport_error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Finish reasons that mean the candidate was withheld by policy.
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: http_client(timeout),
        }
    }

    /// Point at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_path(model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("models/{model}")
    }

    /// Translate a provider request into a `generateContent` body.
    ///
    /// System messages become the system instruction. Consecutive tool
    /// results are grouped into one turn, each answering the function call
    /// whose id it carries.
    fn build_body(request: &ProviderRequest) -> Value {
        let call_names: HashMap<&str, &str> = request
            .messages
            .iter()
            .flat_map(|m| m.tool_calls.iter())
            .map(|tc| (tc.id.as_str(), tc.name.as_str()))
            .collect();

        let system_text: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let mut contents: Vec<Value> = Vec::new();
        for message in request.messages.iter().filter(|m| m.role != Role::System) {
            match message.role {
                Role::Tool => {
                    let name = message
                        .tool_call_id
                        .as_deref()
                        .and_then(|id| call_names.get(id))
                        .copied()
                        .unwrap_or("unknown");
                    let part = json!({
                        "functionResponse": {
                            "name": name,
                            "response": { "content": message.content },
                        }
                    });

                    let previous_is_tool_turn = contents.last().is_some_and(|c| {
                        c["parts"][0].get("functionResponse").is_some()
                    });
                    match contents.last_mut() {
                        Some(last) if previous_is_tool_turn => {
                            if let Some(parts) = last["parts"].as_array_mut() {
                                parts.push(part);
                            }
                        }
                        _ => contents.push(json!({ "role": "user", "parts": [part] })),
                    }
                }
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !message.content.is_empty() {
                        parts.push(json!({ "text": message.content }));
                    }
                    for tc in &message.tool_calls {
                        let args: Value =
                            serde_json::from_str(&tc.arguments).unwrap_or_else(|_| json!({}));
                        parts.push(json!({ "functionCall": { "name": tc.name, "args": args } }));
                    }
                    contents.push(json!({ "role": "model", "parts": parts }));
                }
                Role::User | Role::System => {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{ "text": message.content }],
                    }));
                }
            }
        }

        let mut generation_config = json!({ "temperature": request.temperature });
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });

        if !system_text.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system_text.join("\n\n") }] });
        }

        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        body
    }

    fn into_response(
        api: GenerateResponse,
        requested_model: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let Some(candidate) = api.candidates.into_iter().next() else {
            if let Some(reason) = api.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(ProviderError::ContentBlocked(reason));
            }
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: "No candidates in response".into(),
            });
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKED_FINISH_REASONS.contains(&reason) {
                return Err(ProviderError::ContentBlocked(reason.to_string()));
            }
        }

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(MessageToolCall {
                    id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                    name: call.name,
                    arguments: call.args.unwrap_or_else(|| json!({})).to_string(),
                });
            }
        }

        let mut message = Message::assistant(text);
        message.tool_calls = tool_calls;

        let usage = api.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api.model_version.unwrap_or_else(|| requested_model.to_string()),
        })
    }

    /// Pull `error.message` out of a Google API error body, falling back to
    /// the raw text.
    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or_else(|| body.to_string())
    }

    /// Map a non-200 `generateContent` status.
    fn map_status(status: u16, body: &str, model: &str) -> ProviderError {
        let message = Self::error_message(body);
        match status {
            429 => ProviderError::RateLimited,
            401 | 403 => ProviderError::AuthenticationFailed(message),
            404 => ProviderError::ModelNotFound(model.to_string()),
            _ => ProviderError::ApiError {
                status_code: status,
                message,
            },
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("GEMINI_API_KEY is not set".into()));
        }

        let url = format!(
            "{}/{}:generateContent",
            self.base_url,
            Self::model_path(&request.model)
        );
        let body = Self::build_body(&request);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, "Gemini returned error");
            return Err(Self::map_status(status, &body, &request.model));
        }

        let api: GenerateResponse = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        Self::into_response(api, &request.model)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        if self.api_key.is_empty() {
            return Ok(false);
        }

        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}
