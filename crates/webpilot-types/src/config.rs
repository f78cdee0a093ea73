//! Configuration types for webpilot.
//!
//! `WebpilotConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default, so an empty or missing file yields
//! a usable configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from `~/.webpilot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebpilotConfig {
    /// Workflow definition directory, relative to the data dir unless absolute.
    #[serde(default = "default_workflows_dir")]
    pub workflows_dir: String,

    /// Repair suggestion directory, relative to the data dir unless absolute.
    #[serde(default = "default_repairs_dir")]
    pub repairs_dir: String,

    #[serde(default)]
    pub healing: HealingConfig,

    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub actuator: ActuatorConfig,
}

fn default_workflows_dir() -> String {
    "workflows".to_string()
}

fn default_repairs_dir() -> String {
    "repairs".to_string()
}

impl Default for WebpilotConfig {
    fn default() -> Self {
        Self {
            workflows_dir: default_workflows_dir(),
            repairs_dir: default_repairs_dir(),
            healing: HealingConfig::default(),
            oracle: OracleConfig::default(),
            actuator: ActuatorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// OpenAI-compatible chat-completions endpoint used for intent parsing and
/// repair advice. The oracle is enabled only when the key env var is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,
    #[serde(default = "default_oracle_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

fn default_oracle_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_oracle_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_oracle_timeout() -> u64 {
    20
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_base_url(),
            model: default_oracle_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_oracle_timeout(),
        }
    }
}

/// Capability provider settings. Without an endpoint the simulated actuator
/// is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_actuator_timeout")]
    pub timeout_secs: u64,
    /// URL used by agent-mode navigation when the prompt carries none.
    #[serde(default = "default_url")]
    pub default_url: String,
    #[serde(default = "default_screenshot_path")]
    pub default_screenshot_path: String,
}

fn default_actuator_timeout() -> u64 {
    60
}

fn default_url() -> String {
    "https://example.com".to_string()
}

fn default_screenshot_path() -> String {
    "screenshot.png".to_string()
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_actuator_timeout(),
            default_url: default_url(),
            default_screenshot_path: default_screenshot_path(),
        }
    }
}
