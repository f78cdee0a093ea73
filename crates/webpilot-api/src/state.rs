//! Application state wiring all components together.
//!
//! The core components are generic over repository traits; AppState pins
//! them to the file-backed infra implementations and picks the actuator and
//! oracle once, from configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use webpilot_core::engine::ExecutionEngine;
use webpilot_core::healing::SelfHealingEngine;
use webpilot_core::router::parser::IntentParser;
use webpilot_core::router::{AgentDefaults, PromptRouter};
use webpilot_core::service::WorkflowService;
use webpilot_core::store::WorkflowStore;
use webpilot_infra::actuator::build_actuator;
use webpilot_infra::config::load_config;
use webpilot_infra::filesystem::{resolve_data_dir, resolve_under};
use webpilot_infra::oracle::build_oracle;
use webpilot_infra::storage::{JsonSuggestionRepository, YamlWorkflowRepository};
use webpilot_types::config::WebpilotConfig;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteWorkflowService = WorkflowService<YamlWorkflowRepository, JsonSuggestionRepository>;

pub struct AppState {
    pub service: Arc<ConcreteWorkflowService>,
    pub config: WebpilotConfig,
    pub data_dir: PathBuf,
    pub workflows_dir: PathBuf,
    pub actuator_name: String,
    pub oracle_name: Option<String>,
}

impl AppState {
    /// Open the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        Self::open(resolve_data_dir()).await
    }

    /// Load config, read persisted workflows and healing records, wire the
    /// components.
    pub async fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let workflows_dir = resolve_under(&data_dir, &config.workflows_dir);
        let repairs_dir = resolve_under(&data_dir, &config.repairs_dir);

        let store = Arc::new(WorkflowStore::new(YamlWorkflowRepository::new(
            workflows_dir.clone(),
        )));
        let loaded = store.load_all().await?;
        tracing::debug!(loaded, dir = %workflows_dir.display(), "workflow store ready");

        let oracle = build_oracle(&config.oracle).map(Arc::new);
        let oracle_name = oracle.as_ref().map(|o| o.name().to_string());

        let healer = Arc::new(SelfHealingEngine::new(
            Arc::clone(&store),
            JsonSuggestionRepository::new(repairs_dir),
            oracle.clone(),
        ));
        healer.set_enabled(config.healing.enabled);
        healer.load_suggestions().await?;
        healer.load_failures().await?;

        let actuator = Arc::new(build_actuator(&config.actuator));
        let actuator_name = actuator.name().to_string();

        let engine = Arc::new(
            ExecutionEngine::new(Arc::clone(&store), actuator).with_healing(Arc::clone(&healer)),
        );

        let router = PromptRouter::new(
            Arc::clone(&store),
            Arc::clone(&engine),
            IntentParser::new(oracle, Duration::from_secs(config.oracle.timeout_secs)),
            AgentDefaults {
                url: config.actuator.default_url.clone(),
                screenshot_path: config.actuator.default_screenshot_path.clone(),
            },
        );

        let service = Arc::new(WorkflowService::new(store, engine, router, healer));

        Ok(Self {
            service,
            config,
            data_dir,
            workflows_dir,
            actuator_name,
            oracle_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use webpilot_types::workflow::Variables;

    #[tokio::test]
    async fn test_open_empty_dir_uses_simulated_actuator() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::open(tmp.path().to_path_buf()).await.unwrap();

        assert_eq!(state.actuator_name, "simulated");
        assert_eq!(state.workflows_dir, tmp.path().join("workflows"));
        assert!(state.service.list_workflows().await.is_empty());
    }

    #[tokio::test]
    async fn test_samples_persist_across_processes() {
        let tmp = TempDir::new().unwrap();
        let first = AppState::open(tmp.path().to_path_buf()).await.unwrap();
        first.service.store().create_samples().await.unwrap();

        let second = AppState::open(tmp.path().to_path_buf()).await.unwrap();
        let names: Vec<String> = second
            .service
            .list_workflows()
            .await
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, ["jira_ticket_export", "test_navigation"]);

        let result = second
            .service
            .run_workflow("test_navigation", &Variables::new())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.executed_steps, 3);
    }
}
