//! The workflow store: the canonical, in-memory set of workflow definitions.
//!
//! `WorkflowStore` wraps a [`WorkflowRepository`] with an ordered index.
//! Reads go through a `RwLock`; writes are serialized by a separate mutex so
//! that a save persists first and only then becomes visible in the index.
//! Concurrent saves of the same name are last-writer-wins.

use chrono::Utc;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use webpilot_types::error::StoreError;
use webpilot_types::workflow::{Step, WorkflowSpec, WorkflowSummary};

use crate::repository::WorkflowRepository;

pub struct WorkflowStore<R: WorkflowRepository> {
    repo: R,
    /// Store iteration order: load order, then first-save order for new names.
    index: RwLock<Vec<WorkflowSpec>>,
    write_lock: Mutex<()>,
}

impl<R: WorkflowRepository> WorkflowStore<R> {
    /// Create an empty store. Call [`load_all`](Self::load_all) to populate it.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            index: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the in-memory index with every persisted definition.
    ///
    /// Returns the number of workflows loaded. A second definition with an
    /// already-loaded name is ignored.
    pub async fn load_all(&self) -> Result<usize, StoreError> {
        let loaded = self.repo.load_all().await?;

        let mut workflows: Vec<WorkflowSpec> = Vec::with_capacity(loaded.len());
        for spec in loaded {
            if workflows.iter().any(|w| w.name == spec.name) {
                warn!(workflow = %spec.name, "duplicate workflow name, keeping the first definition");
                continue;
            }
            workflows.push(spec);
        }

        let count = workflows.len();
        *self.index.write().await = workflows;
        debug!(count, "loaded workflows");
        Ok(count)
    }

    /// First workflow whose domain contains `site`, or whose name contains
    /// `intent` (case-insensitive), in store order.
    ///
    /// Both rules are checked per candidate, so an earlier name match wins
    /// over a later domain match. This is a loose heuristic: callers must
    /// tolerate false positives.
    pub async fn find(&self, site: Option<&str>, intent: &str) -> Option<WorkflowSpec> {
        let site = site.filter(|s| !s.is_empty());
        let intent = intent.to_lowercase();

        let index = self.index.read().await;
        index
            .iter()
            .find(|w| {
                let domain_match = match (site, w.domain.as_deref()) {
                    (Some(site), Some(domain)) => domain.contains(site),
                    _ => false,
                };
                domain_match || w.name.to_lowercase().contains(&intent)
            })
            .cloned()
    }

    pub async fn get(&self, name: &str) -> Option<WorkflowSpec> {
        let index = self.index.read().await;
        index.iter().find(|w| w.name == name).cloned()
    }

    pub async fn list(&self) -> Vec<WorkflowSummary> {
        let index = self.index.read().await;
        index.iter().map(WorkflowSpec::summary).collect()
    }

    /// Upsert by name. Returns `false` (and logs) on any failure.
    pub async fn save(&self, spec: &WorkflowSpec) -> bool {
        match self.try_save(spec).await {
            Ok(()) => true,
            Err(e) => {
                warn!(workflow = %spec.name, error = %e, "failed to save workflow");
                false
            }
        }
    }

    /// Upsert by name, reporting the failure.
    ///
    /// The definition is persisted before the index is updated; on error the
    /// index is left untouched.
    pub async fn try_save(&self, spec: &WorkflowSpec) -> Result<(), StoreError> {
        WorkflowSpec::validate_name(&spec.name).map_err(StoreError::InvalidName)?;

        let _guard = self.write_lock.lock().await;
        self.repo.save(spec).await?;

        let mut index = self.index.write().await;
        match index.iter_mut().find(|w| w.name == spec.name) {
            Some(existing) => *existing = spec.clone(),
            None => index.push(spec.clone()),
        }
        info!(workflow = %spec.name, steps = spec.steps.len(), "saved workflow");
        Ok(())
    }

    /// Save an empty workflow shell under `name`.
    pub async fn record(&self, name: &str) -> Result<WorkflowSpec, StoreError> {
        let shell = WorkflowSpec::new(name);
        self.try_save(&shell).await?;
        Ok(shell)
    }

    /// Seed the reference workflows. Returns their names.
    pub async fn create_samples(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for spec in sample_workflows() {
            self.try_save(&spec).await?;
            names.push(spec.name);
        }
        Ok(names)
    }
}

/// An export-style workflow and a navigation-style workflow.
pub fn sample_workflows() -> Vec<WorkflowSpec> {
    let created = json!(Utc::now().to_rfc3339());

    let mut export = WorkflowSpec::new("jira_ticket_export")
        .with_domain("jira.company.com")
        .with_step(Step::single("navigate", "url", "https://example.com"))
        .with_step(Step::single("screenshot", "path", "jira_export.png"))
        .with_metadata("description", json!("Export Jira tickets for a project"))
        .with_metadata("created", created.clone())
        .with_metadata("sensitive", json!(false));
    for var in ["project_key", "start_date", "end_date"] {
        export.variables.insert(var.to_string(), "str".to_string());
    }

    let navigation = WorkflowSpec::new("test_navigation")
        .with_domain("example.com")
        .with_step(Step::single("navigate", "url", "https://example.com"))
        .with_step(Step::single("screenshot", "path", "test.png"))
        .with_step(Step::single("extract", "selector", "h1"))
        .with_metadata("description", json!("Simple test workflow"))
        .with_metadata("created", created)
        .with_metadata("sensitive", json!(false));

    vec![export, navigation]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryWorkflowRepository, navigation_workflow};
    use std::sync::Arc;

    async fn store_with(workflows: Vec<WorkflowSpec>) -> WorkflowStore<InMemoryWorkflowRepository> {
        let store = WorkflowStore::new(InMemoryWorkflowRepository::with(workflows));
        store.load_all().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_find_by_domain_ignores_intent() {
        let store = store_with(sample_workflows()).await;
        let found = store
            .find(Some("jira.company.com"), "something-unrelated")
            .await
            .unwrap();
        assert_eq!(found.name, "jira_ticket_export");
    }

    #[tokio::test]
    async fn test_find_by_domain_substring() {
        let store = store_with(sample_workflows()).await;
        let found = store.find(Some("jira"), "export").await.unwrap();
        assert_eq!(found.name, "jira_ticket_export");
    }

    #[tokio::test]
    async fn test_find_by_intent_is_case_insensitive() {
        let store = store_with(sample_workflows()).await;
        let found = store.find(None, "NAVIGATION").await.unwrap();
        assert_eq!(found.name, "test_navigation");
    }

    #[tokio::test]
    async fn test_find_first_candidate_wins_in_store_order() {
        // Name match on the first candidate beats a domain match on the second.
        let first = WorkflowSpec::new("github_export").with_domain("github.com");
        let second = WorkflowSpec::new("jira_sync").with_domain("jira.company.com");
        let store = store_with(vec![first, second]).await;

        let found = store.find(Some("jira.company.com"), "export").await.unwrap();
        assert_eq!(found.name, "github_export");
    }

    #[tokio::test]
    async fn test_find_no_match() {
        let store = store_with(sample_workflows()).await;
        assert!(store.find(Some("salesforce.com"), "general").await.is_none());
        assert!(store.find(Some(""), "general").await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_get_roundtrip() {
        let repo = InMemoryWorkflowRepository::default();
        let store = WorkflowStore::new(repo.clone());
        let spec = navigation_workflow();

        assert!(store.save(&spec).await);
        assert_eq!(store.get("test_navigation").await, Some(spec.clone()));

        // A fresh store over the same repository sees the same definition.
        let reloaded = WorkflowStore::new(repo);
        assert_eq!(reloaded.load_all().await.unwrap(), 1);
        assert_eq!(reloaded.get("test_navigation").await, Some(spec));
    }

    #[tokio::test]
    async fn test_save_upserts_in_place() {
        let store = store_with(sample_workflows()).await;
        let mut updated = store.get("jira_ticket_export").await.unwrap();
        updated.version = "2.0".to_string();

        assert!(store.save(&updated).await);
        let names: Vec<String> = store.list().await.into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["jira_ticket_export", "test_navigation"]);
        assert_eq!(store.get("jira_ticket_export").await.unwrap().version, "2.0");
    }

    #[tokio::test]
    async fn test_save_failure_returns_false_and_keeps_index() {
        let repo = InMemoryWorkflowRepository::default();
        let store = WorkflowStore::new(repo.clone());
        repo.set_fail_saves(true);

        assert!(!store.save(&navigation_workflow()).await);
        assert!(store.get("test_navigation").await.is_none());
    }

    #[tokio::test]
    async fn test_try_save_rejects_invalid_name() {
        let store = store_with(vec![]).await;
        let err = store.try_save(&WorkflowSpec::new("a/b")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_load_all_keeps_first_duplicate() {
        let mut dup = navigation_workflow();
        dup.version = "9.9".to_string();
        let store = store_with(vec![navigation_workflow(), dup]).await;
        assert_eq!(store.list().await.len(), 1);
        assert_eq!(store.get("test_navigation").await.unwrap().version, "1.0");
    }

    #[tokio::test]
    async fn test_record_creates_empty_shell() {
        let store = store_with(vec![]).await;
        let shell = store.record("checkout").await.unwrap();
        assert_eq!(shell.version, "1.0");
        assert!(shell.steps.is_empty());
        assert!(shell.variables.is_empty());
        assert_eq!(store.get("checkout").await, Some(shell));
    }

    #[tokio::test]
    async fn test_create_samples() {
        let store = store_with(vec![]).await;
        let names = store.create_samples().await.unwrap();
        assert_eq!(names, ["jira_ticket_export", "test_navigation"]);

        let export = store.get("jira_ticket_export").await.unwrap();
        assert_eq!(export.variables.len(), 3);
        assert_eq!(export.description(), "Export Jira tickets for a project");
    }

    #[tokio::test]
    async fn test_concurrent_saves_of_different_names() {
        let repo = InMemoryWorkflowRepository::default();
        let store = Arc::new(WorkflowStore::new(repo.clone()));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.save(&WorkflowSpec::new(format!("wf_{i}"))).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(store.list().await.len(), 16);
        for i in 0..16 {
            assert!(repo.persisted(&format!("wf_{i}")).is_some());
        }
    }
}
