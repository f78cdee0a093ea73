//! Offline actuator.
//!
//! Performs no browser work. Every action succeeds and echoes its inputs
//! along with a note that it was simulated, which is enough to exercise
//! workflows, routing and the CLI without a browser backend.

use serde_json::json;

use webpilot_core::actuator::{ActionResult, Actuator};
use webpilot_types::workflow::{Action, StepArgs};

#[derive(Debug, Default, Clone)]
pub struct SimulatedActuator;

impl SimulatedActuator {
    pub fn new() -> Self {
        Self
    }
}

impl Actuator for SimulatedActuator {
    fn name(&self) -> &str {
        "simulated"
    }

    fn supports(&self, _action: Action) -> bool {
        true
    }

    async fn navigate(&self, url: &str) -> ActionResult {
        tracing::debug!(url, "simulated navigate");
        Ok(json!({
            "url": url,
            "message": "Navigation simulated",
        }))
    }

    async fn click(&self, selector: &str) -> ActionResult {
        tracing::debug!(selector, "simulated click");
        Ok(json!({
            "selector": selector,
            "message": "Click simulated",
        }))
    }

    async fn type_text(&self, selector: &str, text: &str) -> ActionResult {
        tracing::debug!(selector, "simulated type");
        Ok(json!({
            "selector": selector,
            "text": text,
            "message": "Typing simulated",
        }))
    }

    async fn extract(&self, selector: &str) -> ActionResult {
        tracing::debug!(selector, "simulated extract");
        Ok(json!({
            "selector": selector,
            "content": "Simulated extracted content",
        }))
    }

    async fn screenshot(&self, path: &str) -> ActionResult {
        tracing::debug!(path, "simulated screenshot");
        Ok(json!({
            "path": path,
            "message": "Screenshot simulated",
        }))
    }

    async fn authenticate(&self, args: &StepArgs) -> ActionResult {
        tracing::debug!(?args, "simulated authenticate");
        Ok(json!({
            "authenticated": true,
            "message": "Authentication simulated",
        }))
    }
}
