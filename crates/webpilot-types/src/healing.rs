//! Self-healing domain types: failure records and repair suggestions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::Step;

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// Immutable record of a step failure, appended to the failure log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub workflow_name: String,
    pub step_index: usize,
    pub error_type: String,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_snapshot: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Optional evidence captured alongside a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureContext {
    pub screenshot_path: Option<String>,
    pub dom_snapshot: Option<String>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Failure category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    SelectorDrift,
    Timeout,
    NetworkError,
    AuthenticationFailure,
    /// Classified with oracle assistance.
    GenericError,
    UnknownError,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::SelectorDrift => "selector_drift",
            IssueType::Timeout => "timeout",
            IssueType::NetworkError => "network_error",
            IssueType::AuthenticationFailure => "authentication_failure",
            IssueType::GenericError => "generic_error",
            IssueType::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RepairSuggestion
// ---------------------------------------------------------------------------

/// How a suggested fix is applied to the target workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    /// Replace the step at `step_index`.
    #[default]
    Replace,
    /// Insert the fix ahead of the step at `step_index`.
    InsertBefore,
}

/// Lifecycle state of a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    #[default]
    Suggested,
    Applied,
    Discarded,
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepairStatus::Suggested => "suggested",
            RepairStatus::Applied => "applied",
            RepairStatus::Discarded => "discarded",
        })
    }
}

/// A proposed modification to one workflow step, held until approved or
/// discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairSuggestion {
    pub id: Uuid,
    pub workflow_name: String,
    pub step_index: usize,
    pub issue_type: IssueType,
    pub issue_description: String,
    pub suggested_fix: Step,
    #[serde(default)]
    pub kind: RepairKind,
    /// In `[0, 1]`.
    pub confidence_score: f64,
    #[serde(default)]
    pub status: RepairStatus,
    pub timestamp: DateTime<Utc>,
}

impl RepairSuggestion {
    /// Persistence key: workflow name, step index, a microsecond timestamp
    /// and the random tail of the id. Unique per suggestion.
    pub fn record_key(&self) -> String {
        let id = self.id.simple().to_string();
        format!(
            "{}_{}_{}_{}",
            self.workflow_name,
            self.step_index,
            self.timestamp.format("%Y%m%d_%H%M%S_%6f"),
            &id[id.len() - 12..]
        )
    }
}

// ---------------------------------------------------------------------------
// HealingResult
// ---------------------------------------------------------------------------

/// Outcome of handing a failure to the self-healing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingResult {
    pub success: bool,
    pub failure_recorded: bool,
    pub repair_suggested: bool,
    pub requires_approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<RepairSuggestion>,
    pub message: String,
}

impl HealingResult {
    pub fn disabled() -> Self {
        Self {
            success: false,
            failure_recorded: false,
            repair_suggested: false,
            requires_approval: false,
            suggestion: None,
            message: "self-healing disabled".to_string(),
        }
    }

    pub fn suggested(suggestion: RepairSuggestion) -> Self {
        let message = format!(
            "repair suggested for {} step {}: {}",
            suggestion.workflow_name, suggestion.step_index, suggestion.issue_description
        );
        Self {
            success: true,
            failure_recorded: true,
            repair_suggested: true,
            requires_approval: true,
            suggestion: Some(suggestion),
            message,
        }
    }

    pub fn no_suggestion(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            failure_recorded: true,
            repair_suggested: false,
            requires_approval: false,
            suggestion: None,
            message: reason.into(),
        }
    }
}
