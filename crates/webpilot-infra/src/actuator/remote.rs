//! HTTP actuator.
//!
//! Forwards every action to a single endpoint as
//! `POST {endpoint}` with body `{"action": "...", "args": {...}}` and expects
//! `{"success": bool, "data": ..., "error": "..."}` back. A response with
//! `success: false` becomes [`ActuatorError::Failed`] carrying the provider's
//! message, which is what the self-healing classifier inspects.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use webpilot_core::actuator::{ActionResult, Actuator};
use webpilot_types::error::ActuatorError;
use webpilot_types::workflow::{Action, StepArgs};

#[derive(Debug, Serialize)]
struct ActionRequest<'a> {
    action: &'a str,
    args: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RemoteActuator {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

impl RemoteActuator {
    pub fn new(endpoint: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout_secs,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, action: &str, args: Map<String, Value>) -> ActionResult {
        let body = ActionRequest { action, args };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ActuatorError::Failed(format!("HTTP {status}: {error_body}")));
        }

        let parsed: ActionResponse = response
            .json()
            .await
            .map_err(|e| ActuatorError::Transport(format!("failed to parse response: {e}")))?;

        if parsed.success {
            Ok(parsed.data.unwrap_or(Value::Null))
        } else {
            let message = parsed.error.unwrap_or_else(|| format!("{action} failed"));
            tracing::debug!(action, %message, "remote action failed");
            Err(ActuatorError::Failed(message))
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ActuatorError {
        if err.is_timeout() {
            ActuatorError::Timeout(self.timeout_secs)
        } else {
            ActuatorError::Transport(format!("HTTP request failed: {err}"))
        }
    }
}

fn single(key: &str, value: &str) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert(key.to_string(), Value::String(value.to_string()));
    args
}

impl Actuator for RemoteActuator {
    fn name(&self) -> &str {
        "remote"
    }

    /// The endpoint decides what it can do; unsupported actions come back
    /// as ordinary failures.
    fn supports(&self, _action: Action) -> bool {
        true
    }

    async fn navigate(&self, url: &str) -> ActionResult {
        self.send(Action::Navigate.as_str(), single("url", url)).await
    }

    async fn click(&self, selector: &str) -> ActionResult {
        self.send(Action::Click.as_str(), single("selector", selector)).await
    }

    async fn type_text(&self, selector: &str, text: &str) -> ActionResult {
        let mut args = single("selector", selector);
        args.insert("text".to_string(), Value::String(text.to_string()));
        self.send(Action::Type.as_str(), args).await
    }

    async fn extract(&self, selector: &str) -> ActionResult {
        self.send(Action::Extract.as_str(), single("selector", selector)).await
    }

    async fn screenshot(&self, path: &str) -> ActionResult {
        self.send(Action::Screenshot.as_str(), single("path", path)).await
    }

    async fn authenticate(&self, args: &StepArgs) -> ActionResult {
        self.send(Action::Authenticate.as_str(), args.clone()).await
    }

    async fn wait_for_load(&self) -> Result<(), ActuatorError> {
        self.send("wait_for_load", Map::new()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn actuator_for(server: &MockServer) -> RemoteActuator {
        RemoteActuator::new(format!("{}/actions", server.uri()), 5)
    }

    #[tokio::test]
    async fn test_successful_action_returns_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/actions"))
            .and(body_json(json!({"action": "extract", "args": {"selector": "h1"}})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": {"content": "Example Domain"}})),
            )
            .mount(&server)
            .await;

        let data = actuator_for(&server).await.extract("h1").await.unwrap();
        assert_eq!(data, json!({"content": "Example Domain"}));
    }

    #[tokio::test]
    async fn test_reported_failure_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"success": false, "error": "element not found: #submit"}),
            ))
            .mount(&server)
            .await;

        let err = actuator_for(&server).await.click("#submit").await.unwrap_err();
        assert_eq!(err, ActuatorError::Failed("element not found: #submit".to_string()));
    }

    #[tokio::test]
    async fn test_http_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = actuator_for(&server).await.navigate("https://x.com").await.unwrap_err();
        assert!(matches!(err, ActuatorError::Failed(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let actuator = RemoteActuator::new("http://127.0.0.1:1/actions".to_string(), 5);
        let err = actuator.screenshot("shot.png").await.unwrap_err();
        assert!(matches!(err, ActuatorError::Transport(_)));
    }
}
