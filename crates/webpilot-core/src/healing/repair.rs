//! Repair synthesis per failure category.
//!
//! Each function takes the failing step and returns a [`Proposal`]: a new
//! `Step` (the failing step is never modified in place), how to apply it,
//! and a confidence score.
//!
//! Selector alternatives stay within standard CSS and the text-engine
//! syntax (`text='...'`) that browser drivers accept. Non-standard
//! pseudo-classes such as `:contains()` are not generated.

use serde_json::{Map, Value};

use webpilot_types::healing::{IssueType, RepairKind};
use webpilot_types::workflow::{Action, Step};

/// Timeout assumed for steps that do not declare one, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const NETWORK_RETRY_COUNT: u32 = 3;
pub const NETWORK_RETRY_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub issue_type: IssueType,
    pub description: String,
    pub fix: Step,
    pub kind: RepairKind,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Selector drift
// ---------------------------------------------------------------------------

/// Alternative selectors derived from the failing selector's shape.
pub fn alternative_selectors(selector: &str) -> Vec<String> {
    if selector.is_empty() {
        return Vec::new();
    }
    if let Some(id) = selector.strip_prefix('#') {
        return vec![
            format!(".{id}"),
            format!("[id*='{id}']"),
            format!("[name='{id}']"),
        ];
    }
    if let Some(class) = selector.strip_prefix('.') {
        return vec![
            format!("#{class}"),
            format!("[class*='{class}']"),
            format!("button[class*='{class}']"),
        ];
    }
    let last = selector.split_whitespace().last().unwrap_or(selector);
    vec![
        format!("[data-testid*='{last}']"),
        format!("[aria-label*='{selector}']"),
        format!("text='{selector}'"),
    ]
}

/// Swap in the best alternative selector. An oracle-suggested selector, when
/// given, goes ahead of the heuristic alternatives.
pub fn selector_drift(step: &Step, oracle_selector: Option<String>) -> Proposal {
    let current = step.selector().unwrap_or("");

    let mut candidates = alternative_selectors(current);
    if let Some(hint) = oracle_selector.filter(|h| !h.is_empty() && h != current) {
        candidates.retain(|c| *c != hint);
        candidates.insert(0, hint);
    }

    let (fix, confidence) = match candidates.first() {
        Some(best) => (step.with_arg("selector", best.as_str()), 0.7),
        None => (step.clone(), 0.3),
    };

    Proposal {
        issue_type: IssueType::SelectorDrift,
        description: format!("Selector '{current}' not found. UI may have changed."),
        fix,
        kind: RepairKind::Replace,
        confidence,
    }
}

// ---------------------------------------------------------------------------
// Timeout / network / authentication
// ---------------------------------------------------------------------------

/// Double the step timeout and wait for the page to load.
pub fn timeout(step: &Step) -> Proposal {
    let base = step
        .timeout
        .or_else(|| step.args.get("timeout").and_then(Value::as_u64))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Proposal {
        issue_type: IssueType::Timeout,
        description: "Operation timed out. Page may be loading slowly.".to_string(),
        fix: step.with_timeout(base.saturating_mul(2), true),
        kind: RepairKind::Replace,
        confidence: 0.6,
    }
}

/// Keep the step, add retry metadata.
pub fn network(step: &Step) -> Proposal {
    Proposal {
        issue_type: IssueType::NetworkError,
        description: "Network connectivity issue. Adding retry logic.".to_string(),
        fix: step.with_retry(NETWORK_RETRY_COUNT, NETWORK_RETRY_DELAY_SECS),
        kind: RepairKind::Replace,
        confidence: 0.5,
    }
}

/// Insert a login check ahead of the failing step.
pub fn authentication() -> Proposal {
    let mut args = Map::new();
    args.insert("check_login_state".to_string(), Value::Bool(true));
    args.insert("re_authenticate".to_string(), Value::Bool(true));

    Proposal {
        issue_type: IssueType::AuthenticationFailure,
        description: "Authentication required. Adding login verification step.".to_string(),
        fix: Step::new(Action::Authenticate.as_str(), args),
        kind: RepairKind::InsertBefore,
        confidence: 0.8,
    }
}

// ---------------------------------------------------------------------------
// Unclassified
// ---------------------------------------------------------------------------

/// The unchanged step as a low-actionability "fix". `analysis` is the
/// oracle's description when it was consulted successfully.
pub fn generic(step: &Step, error_message: &str, analysis: Option<String>) -> Proposal {
    let (issue_type, description, confidence) = match analysis {
        Some(text) if !text.trim().is_empty() => (IssueType::GenericError, text, 0.6),
        Some(_) => (
            IssueType::GenericError,
            format!("AI-analyzed error: {error_message}"),
            0.6,
        ),
        None => (
            IssueType::UnknownError,
            format!("Unknown error: {error_message}"),
            0.2,
        ),
    };

    Proposal {
        issue_type,
        description,
        fix: step.clone(),
        kind: RepairKind::Replace,
        confidence,
    }
}
