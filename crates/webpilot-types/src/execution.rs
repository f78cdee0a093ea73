//! Execution outcome types.
//!
//! Step failures are captured into `StepOutcome` rather than raised, so a
//! caller of a workflow run always receives a `WorkflowResult`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::healing::HealingResult;

/// Result of dispatching a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Zero-based index of the step within its workflow.
    pub index: usize,
    pub action: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of actuator attempts, greater than one only for retried steps.
    pub attempts: u32,
}

impl StepOutcome {
    pub fn succeeded(index: usize, action: impl Into<String>, data: Value, attempts: u32) -> Self {
        Self {
            index,
            action: action.into(),
            success: true,
            data: Some(data),
            error: None,
            attempts,
        }
    }

    pub fn failed(
        index: usize,
        action: impl Into<String>,
        error: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            index,
            action: action.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            attempts,
        }
    }
}

/// Aggregated result of a workflow run.
///
/// `success` is true iff every executed step succeeded. Execution stops at
/// the first failing step, so `results.len() == executed_steps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow: String,
    pub success: bool,
    pub executed_steps: usize,
    pub results: Vec<StepOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<usize>,
    /// Present when a failing run was handed to the self-healing engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healing: Option<HealingResult>,
}

impl WorkflowResult {
    /// Error message of the failing step, if any.
    pub fn error(&self) -> Option<&str> {
        self.results
            .iter()
            .find(|r| !r.success)
            .and_then(|r| r.error.as_deref())
    }
}

/// Result of a single directly dispatched command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// One entry of the append-only execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub command: String,
    pub parameters: Value,
    pub result: CommandResult,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_workflow_result_error_reports_failing_step() {
        let result = WorkflowResult {
            workflow: "test_navigation".to_string(),
            success: false,
            executed_steps: 2,
            results: vec![
                StepOutcome::succeeded(0, "navigate", json!({"url": "https://example.com"}), 1),
                StepOutcome::failed(1, "click", "element not found: #go", 1),
            ],
            failed_step: Some(1),
            healing: None,
        };
        assert_eq!(result.error(), Some("element not found: #go"));
    }

    #[test]
    fn test_command_result_serialization_skips_empty_fields() {
        let ok = serde_json::to_value(CommandResult::ok(json!("done"))).unwrap();
        assert_eq!(ok, json!({"success": true, "data": "done"}));

        let err = serde_json::to_value(CommandResult::err("unknown command: hover")).unwrap();
        assert_eq!(
            err,
            json!({"success": false, "error": "unknown command: hover"})
        );
    }
}
