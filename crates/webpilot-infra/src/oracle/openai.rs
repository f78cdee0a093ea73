//! OpenAiOracle -- [`Oracle`] backed by an OpenAI-compatible chat-completions
//! endpoint (`{base_url}/chat/completions`).
//!
//! Both calls request a JSON object response and deserialize the message
//! content into the expected shape. Anything else is reported as
//! [`OracleError::Malformed`]; callers fall back to deterministic logic.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed when
//! building the authorization header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use webpilot_core::oracle::Oracle;
use webpilot_types::config::OracleConfig;
use webpilot_types::error::OracleError;
use webpilot_types::oracle::{OracleIntent, RepairAdvice, RepairAdviceRequest};

const PARSE_SYSTEM_PROMPT: &str = "You are a workflow parsing assistant. Parse user prompts to extract:\n\
1. site: domain/platform (jira, github, salesforce, etc.)\n\
2. intent: action type (navigate, export, create, search, test, etc.)\n\
3. variables: extracted parameters (project_key, url, dates, etc.)\n\n\
Respond ONLY with JSON in this exact format:\n\
{\"site\": \"domain or null\", \"intent\": \"action\", \"variables\": {\"key\": \"value\"}}";

const REPAIR_SYSTEM_PROMPT: &str = "You are a browser automation repair assistant. \
Given a failing workflow step and its error, suggest a fix.\n\
Respond ONLY with JSON in this exact format:\n\
{\"selector\": \"replacement CSS selector or null\", \"description\": \"one-sentence diagnosis\"}";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Does not derive Debug; the API key stays out of log output.
pub struct OpenAiOracle {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiOracle {
    pub fn new(api_key: SecretString, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
            timeout: Duration::from_secs(20),
        }
    }

    pub fn from_config(config: &OracleConfig, api_key: SecretString) -> Self {
        Self::new(api_key, config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a system + user exchange and decode the JSON reply as `T`.
    async fn ask<T: DeserializeOwned>(&self, system: &str, user: String) -> Result<T, OracleError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    OracleError::Transport(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => OracleError::Unavailable,
                _ => OracleError::Transport(format!("HTTP {status}: {error_body}")),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("failed to parse response: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| OracleError::Malformed("response has no choices".to_string()))?;

        decode_content(&content)
    }
}

/// Decode the model's message content, tolerating a fenced code block.
fn decode_content<T: DeserializeOwned>(content: &str) -> Result<T, OracleError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(json.trim()).map_err(|e| OracleError::Malformed(e.to_string()))
}

fn repair_user_message(request: &RepairAdviceRequest) -> String {
    let step = serde_json::to_string(&request.step).unwrap_or_default();
    let mut message = format!(
        "Workflow: {}\nStep {}: {step}\nError: {}",
        request.workflow_name, request.step_index, request.error_message
    );
    if let Some(issue) = request.issue {
        message.push_str(&format!("\nClassified as: {issue}"));
    }
    if let Some(dom) = &request.dom_snapshot {
        message.push_str(&format!("\nDOM snapshot:\n{dom}"));
    }
    message
}

impl Oracle for OpenAiOracle {
    fn name(&self) -> &str {
        "openai"
    }

    async fn parse_prompt(&self, prompt: &str) -> Result<OracleIntent, OracleError> {
        self.ask(PARSE_SYSTEM_PROMPT, format!("Parse this prompt: {prompt}"))
            .await
    }

    async fn advise_repair(&self, request: &RepairAdviceRequest) -> Result<RepairAdvice, OracleError> {
        self.ask(REPAIR_SYSTEM_PROMPT, repair_user_message(request))
            .await
    }
}
