//! Command surface consumed by the CLI and other presentation layers.
//!
//! `WorkflowService` is a thin facade over the store, engine, router and
//! healer. It owns no state of its own beyond the shared components.

use std::sync::Arc;

use uuid::Uuid;

use webpilot_types::error::{EngineError, RepairError, StoreError};
use webpilot_types::execution::{CommandResult, ExecutionLogEntry, WorkflowResult};
use webpilot_types::healing::{Failure, RepairSuggestion};
use webpilot_types::routing::RoutedResult;
use webpilot_types::workflow::{StepArgs, Variables, WorkflowSpec, WorkflowSummary};

use crate::engine::ExecutionEngine;
use crate::healing::SelfHealingEngine;
use crate::repository::{SuggestionRepository, WorkflowRepository};
use crate::router::PromptRouter;
use crate::store::WorkflowStore;

pub struct WorkflowService<R: WorkflowRepository, S: SuggestionRepository> {
    store: Arc<WorkflowStore<R>>,
    engine: Arc<ExecutionEngine<R, S>>,
    router: PromptRouter<R, S>,
    healer: Arc<SelfHealingEngine<R, S>>,
}

impl<R: WorkflowRepository, S: SuggestionRepository> WorkflowService<R, S> {
    pub fn new(
        store: Arc<WorkflowStore<R>>,
        engine: Arc<ExecutionEngine<R, S>>,
        router: PromptRouter<R, S>,
        healer: Arc<SelfHealingEngine<R, S>>,
    ) -> Self {
        Self {
            store,
            engine,
            router,
            healer,
        }
    }

    pub fn store(&self) -> &WorkflowStore<R> {
        &self.store
    }

    pub fn healer(&self) -> &SelfHealingEngine<R, S> {
        &self.healer
    }

    pub async fn list_workflows(&self) -> Vec<WorkflowSummary> {
        self.store.list().await
    }

    pub async fn get_workflow(&self, name: &str) -> Option<WorkflowSpec> {
        self.store.get(name).await
    }

    pub async fn save_workflow(&self, spec: &WorkflowSpec) -> Result<(), StoreError> {
        self.store.try_save(spec).await
    }

    pub async fn run_workflow(
        &self,
        name: &str,
        variables: &Variables,
    ) -> Result<WorkflowResult, EngineError> {
        self.engine.run(name, variables).await
    }

    /// Save an empty workflow shell to be filled in later.
    pub async fn record_workflow(&self, name: &str) -> Result<WorkflowSpec, StoreError> {
        self.store.record(name).await
    }

    pub async fn execute_command(&self, name: &str, params: StepArgs) -> CommandResult {
        self.engine.execute_command(name, params).await
    }

    pub fn execution_log(&self) -> Vec<ExecutionLogEntry> {
        self.engine.execution_log()
    }

    pub async fn handle_prompt(&self, prompt: &str) -> RoutedResult {
        self.router.handle(prompt).await
    }

    pub fn get_repair_suggestions(&self, workflow_name: Option<&str>) -> Vec<RepairSuggestion> {
        self.healer.repair_suggestions(workflow_name)
    }

    pub async fn apply_repair(
        &self,
        suggestion_id: Uuid,
        approved: bool,
    ) -> Result<WorkflowSpec, RepairError> {
        self.healer.apply_repair_by_id(suggestion_id, approved).await
    }

    pub async fn discard_repair(&self, suggestion_id: Uuid) -> Result<RepairSuggestion, RepairError> {
        self.healer.discard_repair(suggestion_id).await
    }

    pub fn get_failure_history(&self, workflow_name: Option<&str>) -> Vec<Failure> {
        self.healer.failure_history(workflow_name)
    }
}
