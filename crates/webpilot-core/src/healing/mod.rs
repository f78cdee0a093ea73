//! Self-healing engine: failure recording, classification, and
//! approval-gated repair.
//!
//! On a reported step failure the engine appends an immutable [`Failure`],
//! classifies the error message, synthesizes a [`RepairSuggestion`], and
//! persists it for human review. Suggestions only ever reach the workflow
//! store through [`SelfHealingEngine::apply_repair`] with `approved = true`;
//! there is no background auto-apply.

pub mod classify;
pub mod repair;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use webpilot_types::error::{RepairError, StepError, StoreError};
use webpilot_types::healing::{
    Failure, FailureContext, HealingResult, IssueType, RepairKind, RepairStatus,
    RepairSuggestion,
};
use webpilot_types::oracle::RepairAdviceRequest;
use webpilot_types::workflow::{Step, WorkflowSpec};

use crate::oracle::BoxOracle;
use crate::repository::{SuggestionRepository, WorkflowRepository};
use crate::store::WorkflowStore;

use self::classify::classify;
use self::repair::Proposal;

pub struct SelfHealingEngine<R: WorkflowRepository, S: SuggestionRepository> {
    store: Arc<WorkflowStore<R>>,
    suggestion_repo: S,
    oracle: Option<Arc<BoxOracle>>,
    enabled: AtomicBool,
    failures: Mutex<Vec<Failure>>,
    suggestions: Mutex<Vec<RepairSuggestion>>,
}

impl<R: WorkflowRepository, S: SuggestionRepository> SelfHealingEngine<R, S> {
    pub fn new(
        store: Arc<WorkflowStore<R>>,
        suggestion_repo: S,
        oracle: Option<Arc<BoxOracle>>,
    ) -> Self {
        Self {
            store,
            suggestion_repo,
            oracle,
            enabled: AtomicBool::new(true),
            failures: Mutex::new(Vec::new()),
            suggestions: Mutex::new(Vec::new()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "self-healing toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Merge persisted suggestions into the in-memory log. Returns the number
    /// of suggestions added.
    pub async fn load_suggestions(&self) -> Result<usize, StoreError> {
        let persisted = self.suggestion_repo.load_all().await?;
        let mut log = lock(&self.suggestions);
        let mut added = 0;
        for suggestion in persisted {
            if log.iter().all(|s| s.id != suggestion.id) {
                log.push(suggestion);
                added += 1;
            }
        }
        log.sort_by_key(|s| s.timestamp);
        debug!(added, "loaded repair suggestions");
        Ok(added)
    }

    /// Merge the persisted failure log into the in-memory one. Returns the
    /// number of failures added.
    pub async fn load_failures(&self) -> Result<usize, StoreError> {
        let persisted = self.suggestion_repo.load_failures().await?;
        let mut log = lock(&self.failures);
        let before = log.len();
        for failure in persisted {
            if !log.contains(&failure) {
                log.push(failure);
            }
        }
        log.sort_by_key(|f| f.timestamp);
        let added = log.len() - before;
        debug!(added, "loaded failure history");
        Ok(added)
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    /// Record a step failure and, when possible, propose a repair.
    ///
    /// Never fails: when no suggestion can be built the result says so and
    /// the original failure is still reported by the caller.
    pub async fn handle_failure(
        &self,
        workflow_name: &str,
        step_index: usize,
        error: &StepError,
        context: FailureContext,
    ) -> HealingResult {
        if !self.is_enabled() {
            return HealingResult::disabled();
        }

        let failure = Failure {
            workflow_name: workflow_name.to_string(),
            step_index,
            error_type: error.kind().to_string(),
            error_message: error.to_string(),
            screenshot_path: context.screenshot_path,
            dom_snapshot: context.dom_snapshot,
            timestamp: Utc::now(),
        };
        lock(&self.failures).push(failure.clone());
        if let Err(e) = self.suggestion_repo.append_failure(&failure).await {
            warn!(workflow = %workflow_name, error = %e, "failed to persist failure record");
        }

        let Some(step) = self.failing_step(workflow_name, step_index).await else {
            warn!(workflow = %workflow_name, step = step_index, "failing step not found, no repair suggested");
            return HealingResult::no_suggestion(format!(
                "step {step_index} of workflow '{workflow_name}' not found"
            ));
        };

        let proposal = self.propose(&failure, &step).await;
        let suggestion = RepairSuggestion {
            id: Uuid::now_v7(),
            workflow_name: workflow_name.to_string(),
            step_index,
            issue_type: proposal.issue_type,
            issue_description: proposal.description,
            suggested_fix: proposal.fix,
            kind: proposal.kind,
            confidence_score: proposal.confidence,
            status: RepairStatus::Suggested,
            timestamp: failure.timestamp,
        };

        self.persist(&suggestion).await;
        lock(&self.suggestions).push(suggestion.clone());
        info!(
            workflow = %workflow_name,
            step = step_index,
            issue = %suggestion.issue_type,
            confidence = suggestion.confidence_score,
            "repair suggested"
        );

        HealingResult::suggested(suggestion)
    }

    async fn failing_step(&self, workflow_name: &str, step_index: usize) -> Option<Step> {
        let workflow = self.store.get(workflow_name).await?;
        workflow.steps.get(step_index).cloned()
    }

    async fn propose(&self, failure: &Failure, step: &Step) -> Proposal {
        match classify(&failure.error_message) {
            Some(IssueType::SelectorDrift) => {
                let hint = self.oracle_selector(failure, step).await;
                repair::selector_drift(step, hint)
            }
            Some(IssueType::Timeout) => repair::timeout(step),
            Some(IssueType::NetworkError) => repair::network(step),
            Some(IssueType::AuthenticationFailure) => repair::authentication(),
            Some(IssueType::GenericError | IssueType::UnknownError) | None => {
                let analysis = self.oracle_analysis(failure, step).await;
                repair::generic(step, &failure.error_message, analysis)
            }
        }
    }

    fn advice_request(
        &self,
        failure: &Failure,
        step: &Step,
        issue: Option<IssueType>,
    ) -> RepairAdviceRequest {
        RepairAdviceRequest {
            workflow_name: failure.workflow_name.clone(),
            step_index: failure.step_index,
            step: step.clone(),
            error_message: failure.error_message.clone(),
            issue,
            dom_snapshot: failure.dom_snapshot.clone(),
        }
    }

    /// Oracle's preferred selector, if any. Oracle errors are logged and
    /// treated as "no hint".
    async fn oracle_selector(&self, failure: &Failure, step: &Step) -> Option<String> {
        let oracle = self.oracle.as_ref()?;
        let request = self.advice_request(failure, step, Some(IssueType::SelectorDrift));
        match oracle.advise_repair(&request).await {
            Ok(advice) => advice.selector,
            Err(e) => {
                warn!(oracle = oracle.name(), error = %e, "selector advice unavailable");
                None
            }
        }
    }

    /// `Some(description)` when the oracle analyzed the failure.
    async fn oracle_analysis(&self, failure: &Failure, step: &Step) -> Option<String> {
        let oracle = self.oracle.as_ref()?;
        let request = self.advice_request(failure, step, None);
        match oracle.advise_repair(&request).await {
            Ok(advice) => Some(advice.description.unwrap_or_default()),
            Err(e) => {
                warn!(oracle = oracle.name(), error = %e, "repair analysis unavailable");
                None
            }
        }
    }

    async fn persist(&self, suggestion: &RepairSuggestion) {
        if let Err(e) = self.suggestion_repo.save(suggestion).await {
            warn!(suggestion = %suggestion.id, error = %e, "failed to persist repair suggestion");
        }
    }

    // -----------------------------------------------------------------------
    // Approval
    // -----------------------------------------------------------------------

    /// Apply `suggestion` to its workflow. Fails with
    /// [`RepairError::ApprovalRequired`] unless `approved` is true.
    ///
    /// Returns the updated workflow as saved.
    pub async fn apply_repair(
        &self,
        suggestion: &RepairSuggestion,
        approved: bool,
    ) -> Result<WorkflowSpec, RepairError> {
        if !approved {
            return Err(RepairError::ApprovalRequired);
        }

        let workflow = self
            .store
            .get(&suggestion.workflow_name)
            .await
            .ok_or_else(|| RepairError::WorkflowNotFound(suggestion.workflow_name.clone()))?;

        let fix = suggestion.suggested_fix.clone();
        let updated = match suggestion.kind {
            RepairKind::Replace => workflow.with_step_replaced(suggestion.step_index, fix),
            RepairKind::InsertBefore => workflow.with_step_inserted(suggestion.step_index, fix),
        }
        .ok_or_else(|| {
            RepairError::Validation(format!(
                "step index {} is out of range for workflow '{}' ({} steps)",
                suggestion.step_index,
                workflow.name,
                workflow.steps.len()
            ))
        })?;

        self.store.try_save(&updated).await?;
        info!(
            workflow = %updated.name,
            step = suggestion.step_index,
            issue = %suggestion.issue_type,
            "repair applied"
        );

        self.set_status(suggestion.id, RepairStatus::Applied).await;
        Ok(updated)
    }

    /// Apply a logged suggestion by id. Only pending suggestions can be
    /// applied.
    pub async fn apply_repair_by_id(
        &self,
        id: Uuid,
        approved: bool,
    ) -> Result<WorkflowSpec, RepairError> {
        if !approved {
            return Err(RepairError::ApprovalRequired);
        }
        let suggestion = self.pending(id)?;
        self.apply_repair(&suggestion, approved).await
    }

    /// Mark a pending suggestion as discarded.
    pub async fn discard_repair(&self, id: Uuid) -> Result<RepairSuggestion, RepairError> {
        self.pending(id)?;
        let discarded = self
            .set_status(id, RepairStatus::Discarded)
            .await
            .ok_or_else(|| RepairError::SuggestionNotFound(id.to_string()))?;
        info!(suggestion = %id, workflow = %discarded.workflow_name, "repair discarded");
        Ok(discarded)
    }

    fn pending(&self, id: Uuid) -> Result<RepairSuggestion, RepairError> {
        let suggestion = self
            .suggestion(id)
            .ok_or_else(|| RepairError::SuggestionNotFound(id.to_string()))?;
        if suggestion.status != RepairStatus::Suggested {
            return Err(RepairError::Validation(format!(
                "suggestion {id} is already {}",
                suggestion.status
            )));
        }
        Ok(suggestion)
    }

    /// Update the logged copy and persist it. Returns the updated suggestion,
    /// or `None` if it is not in the log.
    async fn set_status(&self, id: Uuid, status: RepairStatus) -> Option<RepairSuggestion> {
        let updated = {
            let mut log = lock(&self.suggestions);
            let entry = log.iter_mut().find(|s| s.id == id)?;
            entry.status = status;
            entry.clone()
        };
        self.persist(&updated).await;
        Some(updated)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn suggestion(&self, id: Uuid) -> Option<RepairSuggestion> {
        lock(&self.suggestions).iter().find(|s| s.id == id).cloned()
    }

    /// Pending suggestions, oldest first, optionally for one workflow.
    pub fn repair_suggestions(&self, workflow_name: Option<&str>) -> Vec<RepairSuggestion> {
        lock(&self.suggestions)
            .iter()
            .filter(|s| s.status == RepairStatus::Suggested)
            .filter(|s| workflow_name.is_none_or(|name| s.workflow_name == name))
            .cloned()
            .collect()
    }

    /// Recorded failures, oldest first, optionally for one workflow.
    pub fn failure_history(&self, workflow_name: Option<&str>) -> Vec<Failure> {
        lock(&self.failures)
            .iter()
            .filter(|f| workflow_name.is_none_or(|name| f.workflow_name == name))
            .cloned()
            .collect()
    }
}

/// Logs are append-only, so a poisoned lock still holds consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
