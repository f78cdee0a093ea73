//! Request and response shapes exchanged with the language-model oracle.

use serde::{Deserialize, Serialize};

use crate::healing::IssueType;
use crate::workflow::{Step, Variables};

/// Structured intent returned by the oracle for a natural-language prompt.
///
/// `site` is kept raw; the router normalizes the "null"/"None" sentinels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleIntent {
    #[serde(default)]
    pub site: Option<String>,
    pub intent: String,
    #[serde(default)]
    pub variables: Variables,
}

/// Context sent to the oracle when asking for repair advice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairAdviceRequest {
    pub workflow_name: String,
    pub step_index: usize,
    pub step: Step,
    pub error_message: String,
    /// Category already assigned by the keyword classifier, if any.
    pub issue: Option<IssueType>,
    pub dom_snapshot: Option<String>,
}

/// Advice returned by the oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairAdvice {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
