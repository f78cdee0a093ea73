//! Prompt routing results.

use serde::{Deserialize, Serialize};

use crate::execution::{CommandResult, WorkflowResult};
use crate::workflow::Variables;

/// Which parsing strategy produced a `ParsedPrompt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Oracle,
    Keyword,
    /// The oracle failed and keyword parsing was used instead.
    KeywordFallback,
}

/// `(site, intent, variables)` extracted from a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrompt {
    pub site: Option<String>,
    pub intent: String,
    pub variables: Variables,
    pub strategy: ParseStrategy,
}

/// The path that produced a routed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Workflow,
    Agent,
}

/// One direct actuator call made in agent mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub action: String,
    pub outcome: CommandResult,
}

/// Aggregated result of the direct-actuator fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub message: String,
    pub actions: Vec<AgentAction>,
}

impl AgentResult {
    pub fn all_succeeded(&self) -> bool {
        self.actions.iter().all(|a| a.outcome.success)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteOutcome {
    Workflow(WorkflowResult),
    Agent(AgentResult),
}

/// A workflow that matched the prompt but did not complete successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptedWorkflow {
    pub workflow: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<WorkflowResult>,
}

/// Result of handling a prompt. The router never raises; this is always
/// returned with a success flag and a source tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedResult {
    pub success: bool,
    pub source: RouteSource,
    pub prompt: String,
    pub parsed: ParsedPrompt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    pub result: RouteOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempted: Option<AttemptedWorkflow>,
}
