//! Intent parsing strategies.
//!
//! The strategy is chosen once, when the router is built: oracle-backed if
//! an oracle is configured, keyword-based otherwise. The oracle variant falls
//! back to keyword parsing on any failure and says so in the result.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use webpilot_types::error::OracleError;
use webpilot_types::oracle::OracleIntent;
use webpilot_types::routing::{ParseStrategy, ParsedPrompt};
use webpilot_types::workflow::Variables;

use crate::oracle::BoxOracle;

/// Known sites, checked in order.
const SITES: &[(&str, &str)] = &[
    ("jira", "jira.company.com"),
    ("github", "github.com"),
    ("example.com", "example.com"),
];

/// Intent keyword groups, checked in order. Matching is by substring.
const INTENTS: &[(&str, &[&str])] = &[
    ("export", &["export", "download", "get", "extract"]),
    ("navigate", &["navigate", "go", "visit", "open"]),
    ("test", &["test", "check", "verify"]),
];

pub const GENERAL_INTENT: &str = "general";

/// "project" in any case, then an uppercase key.
static PROJECT_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:project)[:\s]+([A-Z]+)\b").expect("project key pattern is valid")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url pattern is valid"));

/// First absolute URL in `text`.
pub fn extract_url(text: &str) -> Option<&str> {
    URL.find(text).map(|m| m.as_str())
}

pub enum IntentParser {
    Oracle {
        oracle: Arc<BoxOracle>,
        timeout: Duration,
    },
    Keyword,
}

impl IntentParser {
    pub fn new(oracle: Option<Arc<BoxOracle>>, timeout: Duration) -> Self {
        match oracle {
            Some(oracle) => IntentParser::Oracle { oracle, timeout },
            None => IntentParser::Keyword,
        }
    }

    pub async fn parse(&self, prompt: &str) -> ParsedPrompt {
        match self {
            IntentParser::Keyword => parse_keywords(prompt),
            IntentParser::Oracle { oracle, timeout } => {
                match ask_oracle(oracle, *timeout, prompt).await {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(oracle = oracle.name(), error = %e, "ParsingDegraded: oracle parse failed, using keyword parsing");
                        ParsedPrompt {
                            strategy: ParseStrategy::KeywordFallback,
                            ..parse_keywords(prompt)
                        }
                    }
                }
            }
        }
    }
}

async fn ask_oracle(
    oracle: &BoxOracle,
    timeout: Duration,
    prompt: &str,
) -> Result<ParsedPrompt, OracleError> {
    let intent = tokio::time::timeout(timeout, oracle.parse_prompt(prompt))
        .await
        .map_err(|_| OracleError::Timeout(timeout.as_millis() as u64))??;

    let OracleIntent {
        site,
        intent,
        variables,
    } = intent;
    if intent.trim().is_empty() {
        return Err(OracleError::Malformed("empty intent".to_string()));
    }

    let parsed = ParsedPrompt {
        site: site.filter(|s| !matches!(s.trim(), "" | "null" | "None")),
        intent,
        variables,
        strategy: ParseStrategy::Oracle,
    };
    debug!(site = ?parsed.site, intent = %parsed.intent, "oracle parsed prompt");
    Ok(parsed)
}

/// Deterministic keyword and regex parsing.
pub fn parse_keywords(prompt: &str) -> ParsedPrompt {
    let lower = prompt.to_lowercase();

    let site = SITES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, site)| site.to_string());

    let intent = INTENTS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(GENERAL_INTENT, |(intent, _)| *intent)
        .to_string();

    let mut variables = Variables::new();
    if let Some(caps) = PROJECT_KEY.captures(prompt) {
        variables.insert("project_key".to_string(), Value::String(caps[1].to_string()));
    }
    if let Some(url) = extract_url(prompt) {
        variables.insert("url".to_string(), Value::String(url.to_string()));
    }

    debug!(site = ?site, intent = %intent, vars = variables.len(), "keyword parsed prompt");
    ParsedPrompt {
        site,
        intent,
        variables,
        strategy: ParseStrategy::Keyword,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracle;
    use serde_json::json;

    #[test]
    fn test_navigate_prompt() {
        let parsed = parse_keywords("Navigate to https://foo.com and take a screenshot");
        assert_eq!(parsed.intent, "navigate");
        assert_eq!(parsed.site, None);
        assert_eq!(
            serde_json::to_value(&parsed.variables).unwrap(),
            json!({"url": "https://foo.com"})
        );
        assert_eq!(parsed.strategy, ParseStrategy::Keyword);
    }

    #[test]
    fn test_jira_export_prompt() {
        let parsed = parse_keywords("Export tickets from Jira project: ABC for last week");
        assert_eq!(parsed.site.as_deref(), Some("jira.company.com"));
        assert_eq!(parsed.intent, "export");
        assert_eq!(parsed.variables["project_key"], json!("ABC"));
    }

    #[test]
    fn test_project_key_must_be_uppercase() {
        let parsed = parse_keywords("open the project dashboard");
        assert!(!parsed.variables.contains_key("project_key"));
    }

    #[test]
    fn test_intent_priority_and_default() {
        assert_eq!(parse_keywords("verify the login page").intent, "test");
        assert_eq!(parse_keywords("download and open").intent, "export");
        assert_eq!(parse_keywords("hello there").intent, "general");
        assert_eq!(parse_keywords("visit github").site.as_deref(), Some("github.com"));
    }

    #[tokio::test]
    async fn test_keyword_strategy_selected_without_oracle() {
        let parser = IntentParser::new(None, Duration::from_secs(1));
        assert!(matches!(parser, IntentParser::Keyword));
        let parsed = parser.parse("check example.com").await;
        assert_eq!(parsed.site.as_deref(), Some("example.com"));
        assert_eq!(parsed.intent, "test");
    }

    #[tokio::test]
    async fn test_oracle_strategy_normalizes_null_site() {
        let oracle = MockOracle::answering(OracleIntent {
            site: Some("None".to_string()),
            intent: "search".to_string(),
            variables: serde_json::from_value(json!({"query": "rust"})).unwrap(),
        });
        let parser = IntentParser::new(Some(Arc::new(BoxOracle::new(oracle))), Duration::from_secs(1));

        let parsed = parser.parse("search for rust").await;
        assert_eq!(parsed.site, None);
        assert_eq!(parsed.intent, "search");
        assert_eq!(parsed.variables["query"], json!("rust"));
        assert_eq!(parsed.strategy, ParseStrategy::Oracle);
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back_to_keywords() {
        let parser = IntentParser::new(
            Some(Arc::new(BoxOracle::new(MockOracle::broken("not json")))),
            Duration::from_secs(1),
        );
        let parsed = parser.parse("Navigate to https://foo.com").await;
        assert_eq!(parsed.intent, "navigate");
        assert_eq!(parsed.strategy, ParseStrategy::KeywordFallback);
    }

    #[tokio::test]
    async fn test_oracle_timeout_falls_back_to_keywords() {
        let oracle = MockOracle::answering(OracleIntent {
            site: None,
            intent: "export".to_string(),
            variables: Variables::new(),
        })
        .slow(Duration::from_secs(5));
        let parser = IntentParser::new(
            Some(Arc::new(BoxOracle::new(oracle))),
            Duration::from_millis(50),
        );
        let parsed = parser.parse("go to jira").await;
        assert_eq!(parsed.strategy, ParseStrategy::KeywordFallback);
        assert_eq!(parsed.site.as_deref(), Some("jira.company.com"));
    }

    #[tokio::test]
    async fn test_oracle_empty_intent_is_malformed() {
        let oracle = MockOracle::answering(OracleIntent::default());
        let parser = IntentParser::new(Some(Arc::new(BoxOracle::new(oracle))), Duration::from_secs(1));
        let parsed = parser.parse("visit example.com").await;
        assert_eq!(parsed.strategy, ParseStrategy::KeywordFallback);
        assert_eq!(parsed.intent, "navigate");
    }
}
