//! Prompt router: natural language in, workflow run or direct actuation out.
//!
//! Every stage degrades instead of failing: oracle parsing falls back to
//! keyword parsing, and a missing or failing workflow falls back to a
//! minimal keyword-driven sequence of direct actuator calls. `handle` never
//! returns an error; the [`RoutedResult`] carries a success flag and the
//! source that produced it. The agent path always reports success, with
//! per-action failures embedded in its [`AgentResult`].

pub mod parser;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use webpilot_types::routing::{
    AgentAction, AgentResult, AttemptedWorkflow, ParsedPrompt, RouteOutcome, RouteSource,
    RoutedResult,
};
use webpilot_types::workflow::Action;

use crate::engine::ExecutionEngine;
use crate::repository::{SuggestionRepository, WorkflowRepository};
use crate::store::WorkflowStore;

use self::parser::{IntentParser, extract_url};

/// Arguments used by direct actuation when the prompt does not supply them.
#[derive(Debug, Clone)]
pub struct AgentDefaults {
    pub url: String,
    pub screenshot_path: String,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            url: "https://example.com".to_string(),
            screenshot_path: "screenshot.png".to_string(),
        }
    }
}

pub struct PromptRouter<R: WorkflowRepository, S: SuggestionRepository> {
    store: Arc<WorkflowStore<R>>,
    engine: Arc<ExecutionEngine<R, S>>,
    parser: IntentParser,
    defaults: AgentDefaults,
}

impl<R: WorkflowRepository, S: SuggestionRepository> PromptRouter<R, S> {
    pub fn new(
        store: Arc<WorkflowStore<R>>,
        engine: Arc<ExecutionEngine<R, S>>,
        parser: IntentParser,
        defaults: AgentDefaults,
    ) -> Self {
        Self {
            store,
            engine,
            parser,
            defaults,
        }
    }

    pub async fn handle(&self, prompt: &str) -> RoutedResult {
        let parsed = self.parser.parse(prompt).await;

        let Some(workflow) = self
            .store
            .find(parsed.site.as_deref(), &parsed.intent)
            .await
        else {
            info!(site = ?parsed.site, intent = %parsed.intent, "no matching workflow, using direct actuation");
            return self.fall_back(prompt, parsed, None).await;
        };

        info!(workflow = %workflow.name, intent = %parsed.intent, "routing prompt to workflow");
        let attempted = match self.engine.run(&workflow.name, &parsed.variables).await {
            Ok(result) if result.success => {
                return RoutedResult {
                    success: true,
                    source: RouteSource::Workflow,
                    prompt: prompt.to_string(),
                    parsed,
                    workflow: Some(workflow.name),
                    result: RouteOutcome::Workflow(result),
                    attempted: None,
                };
            }
            Ok(result) => AttemptedWorkflow {
                workflow: workflow.name.clone(),
                error: result.error().unwrap_or("workflow failed").to_string(),
                result: Some(result),
            },
            Err(e) => AttemptedWorkflow {
                workflow: workflow.name.clone(),
                error: e.to_string(),
                result: None,
            },
        };

        warn!(workflow = %attempted.workflow, error = %attempted.error, "workflow failed, using direct actuation");
        self.fall_back(prompt, parsed, Some(attempted)).await
    }

    async fn fall_back(
        &self,
        prompt: &str,
        parsed: ParsedPrompt,
        attempted: Option<AttemptedWorkflow>,
    ) -> RoutedResult {
        let agent = self.direct_actuation(prompt, &parsed).await;
        RoutedResult {
            success: true,
            source: RouteSource::Agent,
            prompt: prompt.to_string(),
            parsed,
            workflow: None,
            result: RouteOutcome::Agent(agent),
            attempted,
        }
    }

    /// "navigate" triggers a navigation to the prompt's URL (or the default);
    /// "screenshot" triggers a screenshot. Failures are embedded, not raised.
    async fn direct_actuation(&self, prompt: &str, parsed: &ParsedPrompt) -> AgentResult {
        let lower = prompt.to_lowercase();
        let mut planned: Vec<(Action, Map<String, Value>)> = Vec::new();

        if lower.contains("navigate") {
            let url = parsed
                .variables
                .get("url")
                .and_then(Value::as_str)
                .or_else(|| extract_url(prompt))
                .unwrap_or(&self.defaults.url);
            let mut args = Map::new();
            args.insert("url".to_string(), Value::String(url.to_string()));
            planned.push((Action::Navigate, args));
        }
        if lower.contains("screenshot") {
            let mut args = Map::new();
            args.insert(
                "path".to_string(),
                Value::String(self.defaults.screenshot_path.clone()),
            );
            planned.push((Action::Screenshot, args));
        }

        let mut actions = Vec::with_capacity(planned.len());
        for (action, args) in planned {
            let outcome = self.engine.execute_command(action.as_str(), args).await;
            actions.push(AgentAction {
                action: action.to_string(),
                outcome,
            });
        }

        let message = if actions.is_empty() {
            "no direct actions matched the prompt".to_string()
        } else {
            format!("executed {} direct action(s)", actions.len())
        };
        AgentResult { message, actions }
    }
}
