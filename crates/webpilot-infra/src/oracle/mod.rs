//! Oracle implementations.

pub mod openai;

pub use openai::OpenAiOracle;

use secrecy::SecretString;

use webpilot_core::oracle::BoxOracle;
use webpilot_types::config::OracleConfig;

/// Build the configured oracle, or `None` when no API key is available.
///
/// The key is read from the environment variable named by
/// [`OracleConfig::api_key_env`]; an empty value counts as absent.
pub fn build_oracle(config: &OracleConfig) -> Option<BoxOracle> {
    let key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty());

    match key {
        Some(key) => {
            tracing::info!(model = %config.model, "oracle enabled");
            Some(BoxOracle::new(OpenAiOracle::from_config(
                config,
                SecretString::from(key),
            )))
        }
        None => {
            tracing::info!(
                env = %config.api_key_env,
                "no oracle API key set, using keyword parsing"
            );
            None
        }
    }
}
