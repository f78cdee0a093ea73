//! Workflow execution engine: sequential step dispatch against the actuator.
//!
//! # Execution flow
//!
//! 1. Resolve the workflow by name in the [`WorkflowStore`].
//! 2. For each step in order: substitute `${name}` arguments, resolve the
//!    action into a [`Command`], and dispatch it to the actuator.
//! 3. Stop at the first failing step. Remaining steps never reach the
//!    actuator.
//! 4. If a healer is attached, hand the failure to it and attach the
//!    [`HealingResult`] to the workflow result.
//!
//! Step failures are captured into [`StepOutcome`]s; only an unknown workflow
//! name is returned as an error. Every dispatch (including direct
//! [`ExecutionEngine::execute_command`] calls) is appended to an in-process
//! execution log.
//!
//! Repair metadata on a step is honored here: `timeout` bounds each attempt,
//! `retry_count`/`retry_delay` retry a failed attempt, and `wait_for_load`
//! waits for the page after the action succeeds.

pub mod substitute;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use webpilot_types::error::{ActuatorError, EngineError, StepError};
use webpilot_types::execution::{CommandResult, ExecutionLogEntry, StepOutcome, WorkflowResult};
use webpilot_types::healing::FailureContext;
use webpilot_types::workflow::{Step, StepArgs, Variables};

use crate::actuator::{ActionResult, BoxActuator, Command};
use crate::healing::SelfHealingEngine;
use crate::repository::{SuggestionRepository, WorkflowRepository};
use crate::store::WorkflowStore;

use self::substitute::substitute_args;

pub struct ExecutionEngine<R: WorkflowRepository, S: SuggestionRepository> {
    store: Arc<WorkflowStore<R>>,
    actuator: Arc<BoxActuator>,
    healer: Option<Arc<SelfHealingEngine<R, S>>>,
    log: Mutex<Vec<ExecutionLogEntry>>,
}

impl<R: WorkflowRepository, S: SuggestionRepository> ExecutionEngine<R, S> {
    pub fn new(store: Arc<WorkflowStore<R>>, actuator: Arc<BoxActuator>) -> Self {
        Self {
            store,
            actuator,
            healer: None,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Report step failures to `healer`.
    pub fn with_healing(mut self, healer: Arc<SelfHealingEngine<R, S>>) -> Self {
        self.healer = Some(healer);
        self
    }

    pub fn actuator(&self) -> &BoxActuator {
        &self.actuator
    }

    /// Run the named workflow with `variables`.
    pub async fn run(
        &self,
        name: &str,
        variables: &Variables,
    ) -> Result<WorkflowResult, EngineError> {
        let workflow = self
            .store
            .get(name)
            .await
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;

        info!(workflow = %name, steps = workflow.steps.len(), "running workflow");

        let mut results = Vec::with_capacity(workflow.steps.len());
        let mut failure = None;
        for (index, step) in workflow.steps.iter().enumerate() {
            let args = substitute_args(&step.args, variables);
            debug!(workflow = %name, index, action = %step.action, "dispatching step");

            let (outcome, error) = self.run_step(index, step, args).await;
            results.push(outcome);
            if let Some(error) = error {
                failure = Some((index, error));
                break;
            }
        }

        let mut result = WorkflowResult {
            workflow: name.to_string(),
            success: failure.is_none(),
            executed_steps: results.len(),
            results,
            failed_step: None,
            healing: None,
        };

        match failure {
            None => info!(workflow = %name, steps = result.executed_steps, "workflow completed"),
            Some((index, error)) => {
                warn!(workflow = %name, step = index, error = %error, "workflow step failed");
                result.failed_step = Some(index);
                if let Some(healer) = &self.healer {
                    let healing = healer
                        .handle_failure(name, index, &error, FailureContext::default())
                        .await;
                    result.healing = Some(healing);
                }
            }
        }

        Ok(result)
    }

    /// Dispatch a single action outside any workflow. Never fails: unknown
    /// actions and actuator errors come back as `success: false`.
    pub async fn execute_command(&self, name: &str, params: StepArgs) -> CommandResult {
        let step = Step::new(name, params.clone());
        let (outcome, _) = self.run_step(0, &step, params).await;
        CommandResult {
            success: outcome.success,
            data: outcome.data,
            error: outcome.error,
        }
    }

    /// Snapshot of the execution log, oldest first.
    pub fn execution_log(&self) -> Vec<ExecutionLogEntry> {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Step dispatch
    // -----------------------------------------------------------------------

    async fn run_step(
        &self,
        index: usize,
        step: &Step,
        args: StepArgs,
    ) -> (StepOutcome, Option<StepError>) {
        let (result, attempts) = match self.resolve(step, &args) {
            Ok(command) => self.dispatch_with_retry(step, &command).await,
            Err(e) => (Err(e), 0),
        };

        let logged = match &result {
            Ok(data) => CommandResult::ok(data.clone()),
            Err(e) => CommandResult::err(e.to_string()),
        };
        self.append_log(&step.action, Value::Object(args), logged);

        match result {
            Ok(data) => (StepOutcome::succeeded(index, &step.action, data, attempts), None),
            Err(e) => (
                StepOutcome::failed(index, &step.action, e.to_string(), attempts),
                Some(e),
            ),
        }
    }

    /// Unknown actions, and actions this actuator has no handler for, are
    /// rejected here and never reach the actuator.
    fn resolve(&self, step: &Step, args: &StepArgs) -> Result<Command, StepError> {
        let command = Command::from_args(&step.action, args)?;
        if !self.actuator.supports(command.action()) {
            return Err(StepError::UnknownCommand(step.action.clone()));
        }
        Ok(command)
    }

    async fn dispatch_with_retry(
        &self,
        step: &Step,
        command: &Command,
    ) -> (Result<Value, StepError>, u32) {
        let max_attempts = 1 + step.retry_count.unwrap_or(0);
        let delay = Duration::from_secs(step.retry_delay.unwrap_or(0));
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.dispatch(step, command).await {
                Ok(data) => return (Ok(data), attempt),
                Err(e) if attempt < max_attempts => {
                    warn!(action = %step.action, attempt, max_attempts, error = %e, "step attempt failed, retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return (Err(e.into()), attempt),
            }
        }
    }

    async fn dispatch(&self, step: &Step, command: &Command) -> ActionResult {
        let wait_for_load = step.wait_for_load.unwrap_or(false);
        let attempt = async {
            let data = self.actuator.execute(command).await?;
            if wait_for_load {
                self.actuator.wait_for_load().await?;
            }
            Ok::<_, ActuatorError>(data)
        };

        match step.timeout {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), attempt)
                .await
                .unwrap_or(Err(ActuatorError::Timeout(secs))),
            None => attempt.await,
        }
    }

    fn append_log(&self, command: &str, parameters: Value, result: CommandResult) {
        let entry = ExecutionLogEntry {
            command: command.to_string(),
            parameters,
            result,
            timestamp: Utc::now(),
        };
        match self.log.lock() {
            Ok(mut log) => log.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
