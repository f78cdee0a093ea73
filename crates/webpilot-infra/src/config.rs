//! Configuration loader for webpilot.
//!
//! Reads `config.toml` from the data directory (`~/.webpilot/` in production)
//! and deserializes it into [`WebpilotConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use webpilot_types::config::WebpilotConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`WebpilotConfig::default()`].
/// - Unreadable or unparseable file: logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> WebpilotConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return WebpilotConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return WebpilotConfig::default();
        }
    };

    match toml::from_str::<WebpilotConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            WebpilotConfig::default()
        }
    }
}

/// Write the default configuration if no config file exists yet.
///
/// Returns `true` when a file was written.
pub async fn write_default_config(data_dir: &Path) -> std::io::Result<bool> {
    let config_path = data_dir.join(CONFIG_FILE);
    if tokio::fs::try_exists(&config_path).await? {
        return Ok(false);
    }
    tokio::fs::create_dir_all(data_dir).await?;
    let content = toml::to_string_pretty(&WebpilotConfig::default())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    tokio::fs::write(&config_path, content).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, WebpilotConfig::default());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
repairs_dir = "pending"

[healing]
enabled = false

[actuator]
endpoint = "http://127.0.0.1:9000/actions"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.repairs_dir, "pending");
        assert!(!config.healing.enabled);
        assert_eq!(
            config.actuator.endpoint.as_deref(),
            Some("http://127.0.0.1:9000/actions")
        );
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config, WebpilotConfig::default());
    }

    #[tokio::test]
    async fn write_default_config_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        assert!(write_default_config(tmp.path()).await.unwrap());
        assert!(!write_default_config(tmp.path()).await.unwrap());
        assert_eq!(load_config(tmp.path()).await, WebpilotConfig::default());
    }
}
