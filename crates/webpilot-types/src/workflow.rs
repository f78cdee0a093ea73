//! Workflow domain types.
//!
//! A `WorkflowSpec` is the persisted, human-editable definition of a browser
//! workflow: an ordered list of `Step`s, each naming an action and its
//! arguments. Steps are treated as immutable values; repairs build a new
//! `Step` and the owning spec replaces or inserts it at an index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StepError;

/// Runtime variables supplied to a workflow run, keyed by placeholder name.
pub type Variables = BTreeMap<String, Value>;

/// Arguments of a step: parameter name to literal value or `${name}` reference.
pub type StepArgs = Map<String, Value>;

/// Version assigned to workflows that do not declare one.
pub const DEFAULT_WORKFLOW_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// WorkflowSpec
// ---------------------------------------------------------------------------

/// A named, versioned, ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// Unique key within a store.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Site or hostname hint used by routing.
    #[serde(default)]
    pub domain: Option<String>,
    /// Declared variable names and their types (informational only).
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Free-form metadata (description, created, sensitive, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

fn default_version() -> String {
    DEFAULT_WORKFLOW_VERSION.to_string()
}

impl WorkflowSpec {
    /// An empty workflow shell with the default version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            domain: None,
            variables: BTreeMap::new(),
            steps: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The `description` metadata entry, or an empty string.
    pub fn description(&self) -> &str {
        self.metadata
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Check that the name can serve as a store key and a file stem.
    pub fn validate_name(name: &str) -> Result<(), String> {
        if name.trim().is_empty() {
            return Err("workflow name must not be empty".to_string());
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(format!(
                "workflow name '{name}' must not contain path separators"
            ));
        }
        Ok(())
    }

    /// A copy of this spec with the step at `index` replaced.
    pub fn with_step_replaced(&self, index: usize, step: Step) -> Option<Self> {
        if index >= self.steps.len() {
            return None;
        }
        let mut next = self.clone();
        next.steps[index] = step;
        Some(next)
    }

    /// A copy of this spec with `step` inserted ahead of `index`.
    pub fn with_step_inserted(&self, index: usize, step: Step) -> Option<Self> {
        if index > self.steps.len() {
            return None;
        }
        let mut next = self.clone();
        next.steps.insert(index, step);
        Some(next)
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            name: self.name.clone(),
            version: self.version.clone(),
            domain: self.domain.clone(),
            description: self.description().to_string(),
            steps: self.steps.len(),
        }
    }
}

/// Listing row for a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub version: String,
    pub domain: Option<String>,
    pub description: String,
    pub steps: usize,
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One action invocation with its arguments.
///
/// The repair metadata fields are only ever set by an applied repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    #[serde(default)]
    pub args: StepArgs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    /// Delay between retries, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<u64>,
    /// Per-attempt timeout, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_load: Option<bool>,
}

impl Step {
    pub fn new(action: impl Into<String>, args: StepArgs) -> Self {
        Self {
            action: action.into(),
            args,
            retry_count: None,
            retry_delay: None,
            timeout: None,
            wait_for_load: None,
        }
    }

    /// Convenience constructor for a step with a single argument.
    pub fn single(action: impl Into<String>, key: &str, value: impl Into<Value>) -> Self {
        let mut args = StepArgs::new();
        args.insert(key.to_string(), value.into());
        Self::new(action, args)
    }

    /// The `selector` argument, if it is a string.
    pub fn selector(&self) -> Option<&str> {
        self.args.get("selector").and_then(Value::as_str)
    }

    pub fn with_arg(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.args.insert(key.to_string(), value.into());
        next
    }

    pub fn with_retry(&self, count: u32, delay_secs: u64) -> Self {
        let mut next = self.clone();
        next.retry_count = Some(count);
        next.retry_delay = Some(delay_secs);
        next
    }

    pub fn with_timeout(&self, secs: u64, wait_for_load: bool) -> Self {
        let mut next = self.clone();
        next.timeout = Some(secs);
        next.wait_for_load = Some(wait_for_load);
        next
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The closed set of actions a step may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Navigate,
    Click,
    Type,
    Extract,
    Screenshot,
    Authenticate,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Navigate,
        Action::Click,
        Action::Type,
        Action::Extract,
        Action::Screenshot,
        Action::Authenticate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Navigate => "navigate",
            Action::Click => "click",
            Action::Type => "type",
            Action::Extract => "extract",
            Action::Screenshot => "screenshot",
            Action::Authenticate => "authenticate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| StepError::UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_workflow() -> WorkflowSpec {
        WorkflowSpec::new("test_navigation")
            .with_domain("example.com")
            .with_step(Step::single("navigate", "url", "https://example.com"))
            .with_step(Step::single("screenshot", "path", "test.png"))
            .with_step(Step::single("extract", "selector", "h1"))
            .with_metadata("description", json!("Simple test workflow"))
            .with_metadata("sensitive", json!(false))
    }

    #[test]
    fn test_workflow_yaml_roundtrip_preserves_all_fields() {
        let mut original = sample_workflow();
        original
            .variables
            .insert("project_key".to_string(), "str".to_string());
        original.steps[2] = original.steps[2].with_retry(3, 5).with_timeout(60, true);

        let yaml = serde_yaml_ng::to_string(&original).expect("serialize to YAML");
        assert!(yaml.contains("test_navigation"));
        assert!(yaml.contains("action: navigate"));

        let parsed: WorkflowSpec = serde_yaml_ng::from_str(&yaml).expect("parse YAML");
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_minimal_yaml_applies_defaults() {
        let yaml = r#"
name: jira_ticket_export
steps:
  - action: navigate
    args:
      url: "${url}"
"#;
        let wf: WorkflowSpec = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(wf.version, "1.0");
        assert_eq!(wf.domain, None);
        assert!(wf.metadata.is_empty());
        assert_eq!(wf.steps[0].args["url"], json!("${url}"));
        assert_eq!(wf.steps[0].retry_count, None);
    }

    #[test]
    fn test_unrepaired_step_omits_repair_metadata() {
        let step = Step::single("click", "selector", "#submit");
        let json = serde_json::to_string(&step).unwrap();
        assert!(!json.contains("retry_count"));
        assert!(!json.contains("wait_for_load"));
    }

    #[test]
    fn test_step_builders_do_not_mutate_original() {
        let step = Step::single("click", "selector", "#submit");
        let repaired = step.with_arg("selector", ".submit");
        assert_eq!(step.selector(), Some("#submit"));
        assert_eq!(repaired.selector(), Some(".submit"));
    }

    #[test]
    fn test_with_step_replaced_bounds() {
        let wf = sample_workflow();
        let fix = Step::single("extract", "selector", "h1.title");
        let next = wf.with_step_replaced(2, fix.clone()).unwrap();
        assert_eq!(next.steps[2], fix);
        assert_eq!(wf.steps[2].selector(), Some("h1"));
        assert!(wf.with_step_replaced(3, fix).is_none());
    }

    #[test]
    fn test_with_step_inserted_shifts_following_steps() {
        let wf = sample_workflow();
        let auth = Step::new("authenticate", StepArgs::new());
        let next = wf.with_step_inserted(1, auth.clone()).unwrap();
        assert_eq!(next.steps.len(), 4);
        assert_eq!(next.steps[1], auth);
        assert_eq!(next.steps[2].action, "screenshot");
        assert!(wf.with_step_inserted(4, auth).is_none());
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("navigate".parse::<Action>().unwrap(), Action::Navigate);
        assert_eq!("type".parse::<Action>().unwrap(), Action::Type);
        let err = "hover".parse::<Action>().unwrap_err();
        assert_eq!(err, StepError::UnknownCommand("hover".to_string()));
    }

    #[test]
    fn test_validate_name() {
        assert!(WorkflowSpec::validate_name("jira_ticket_export").is_ok());
        assert!(WorkflowSpec::validate_name("").is_err());
        assert!(WorkflowSpec::validate_name("../etc").is_err());
    }

    #[test]
    fn test_summary_uses_description_metadata() {
        let summary = sample_workflow().summary();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.description, "Simple test workflow");
        assert_eq!(summary.domain.as_deref(), Some("example.com"));
    }
}
