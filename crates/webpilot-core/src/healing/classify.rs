//! Keyword classification of step failure messages.

use webpilot_types::healing::IssueType;

/// Categories checked in priority order; the first keyword hit wins.
const RULES: &[(IssueType, &[&str])] = &[
    (IssueType::SelectorDrift, &["selector", "element not found"]),
    (IssueType::Timeout, &["timeout"]),
    (IssueType::NetworkError, &["network", "connection"]),
    (IssueType::AuthenticationFailure, &["authentication", "login"]),
];

/// Classify an error message (case-insensitive).
///
/// `None` means no keyword matched and the failure goes to the generic,
/// oracle-assisted path.
pub fn classify(message: &str) -> Option<IssueType> {
    let message = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k)))
        .map(|(issue, _)| *issue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category() {
        assert_eq!(classify("element not found: h1.old"), Some(IssueType::SelectorDrift));
        assert_eq!(classify("Navigation Timeout exceeded"), Some(IssueType::Timeout));
        assert_eq!(classify("connection refused"), Some(IssueType::NetworkError));
        assert_eq!(classify("Login page shown"), Some(IssueType::AuthenticationFailure));
        assert_eq!(classify("disk full"), None);
    }

    #[test]
    fn test_selector_takes_priority_over_timeout() {
        assert_eq!(
            classify("timeout waiting for selector '#submit'"),
            Some(IssueType::SelectorDrift)
        );
    }

    #[test]
    fn test_timeout_takes_priority_over_network() {
        assert_eq!(classify("network timeout"), Some(IssueType::Timeout));
    }
}
