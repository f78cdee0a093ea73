//! Hand-written test doubles shared by the core test modules.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use webpilot_types::error::{ActuatorError, OracleError, StoreError};
use webpilot_types::healing::{Failure, RepairSuggestion};
use webpilot_types::oracle::{OracleIntent, RepairAdvice, RepairAdviceRequest};
use webpilot_types::workflow::{Action, Step, StepArgs, WorkflowSpec};

use crate::actuator::{ActionResult, Actuator};
use crate::oracle::Oracle;
use crate::repository::{SuggestionRepository, WorkflowRepository};

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub(crate) struct InMemoryWorkflowRepository {
    workflows: Arc<Mutex<Vec<WorkflowSpec>>>,
    fail_saves: Arc<AtomicBool>,
}

impl InMemoryWorkflowRepository {
    pub fn with(workflows: Vec<WorkflowSpec>) -> Self {
        Self {
            workflows: Arc::new(Mutex::new(workflows)),
            fail_saves: Arc::default(),
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn persisted(&self, name: &str) -> Option<WorkflowSpec> {
        self.workflows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.name == name)
            .cloned()
    }
}

impl WorkflowRepository for InMemoryWorkflowRepository {
    fn load_all(&self) -> impl Future<Output = Result<Vec<WorkflowSpec>, StoreError>> + Send {
        let all = self.workflows.lock().unwrap().clone();
        async move { Ok(all) }
    }

    fn save(&self, spec: &WorkflowSpec) -> impl Future<Output = Result<(), StoreError>> + Send {
        let result = if self.fail_saves.load(Ordering::SeqCst) {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        } else {
            let mut all = self.workflows.lock().unwrap();
            match all.iter_mut().find(|w| w.name == spec.name) {
                Some(existing) => *existing = spec.clone(),
                None => all.push(spec.clone()),
            }
            Ok(())
        };
        async move { result }
    }
}

#[derive(Clone, Default)]
pub(crate) struct InMemorySuggestionRepository {
    suggestions: Arc<Mutex<Vec<RepairSuggestion>>>,
    failures: Arc<Mutex<Vec<Failure>>>,
}

impl InMemorySuggestionRepository {
    pub fn persisted(&self) -> Vec<RepairSuggestion> {
        self.suggestions.lock().unwrap().clone()
    }

    pub fn persisted_failures(&self) -> Vec<Failure> {
        self.failures.lock().unwrap().clone()
    }
}

impl SuggestionRepository for InMemorySuggestionRepository {
    fn save(
        &self,
        suggestion: &RepairSuggestion,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let mut all = self.suggestions.lock().unwrap();
        match all.iter_mut().find(|s| s.id == suggestion.id) {
            Some(existing) => *existing = suggestion.clone(),
            None => all.push(suggestion.clone()),
        }
        async { Ok(()) }
    }

    fn load_all(&self) -> impl Future<Output = Result<Vec<RepairSuggestion>, StoreError>> + Send {
        let all = self.suggestions.lock().unwrap().clone();
        async move { Ok(all) }
    }

    fn append_failure(
        &self,
        failure: &Failure,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.failures.lock().unwrap().push(failure.clone());
        async { Ok(()) }
    }

    fn load_failures(&self) -> impl Future<Output = Result<Vec<Failure>, StoreError>> + Send {
        let all = self.failures.lock().unwrap().clone();
        async move { Ok(all) }
    }
}

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

struct Fault {
    message: String,
    /// `None` fails forever.
    remaining: Option<u32>,
}

/// Records every call as `"{action} {target}"` and succeeds unless told
/// otherwise.
pub(crate) struct MockActuator {
    calls: Arc<Mutex<Vec<String>>>,
    faults: Mutex<HashMap<&'static str, Fault>>,
    delays: HashMap<&'static str, Duration>,
    authenticate: bool,
}

impl MockActuator {
    pub fn new() -> Self {
        Self {
            calls: Arc::default(),
            faults: Mutex::default(),
            delays: HashMap::new(),
            authenticate: false,
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    pub fn failing(self, action: &'static str, message: &str) -> Self {
        self.faults.lock().unwrap().insert(
            action,
            Fault {
                message: message.to_string(),
                remaining: None,
            },
        );
        self
    }

    pub fn failing_times(self, action: &'static str, times: u32, message: &str) -> Self {
        self.faults.lock().unwrap().insert(
            action,
            Fault {
                message: message.to_string(),
                remaining: Some(times),
            },
        );
        self
    }

    pub fn slow(mut self, action: &'static str, delay: Duration) -> Self {
        self.delays.insert(action, delay);
        self
    }

    pub fn with_authenticate(mut self) -> Self {
        self.authenticate = true;
        self
    }

    fn respond(&self, action: &'static str, target: String) -> impl Future<Output = ActionResult> + Send {
        self.calls.lock().unwrap().push(format!("{action} {target}"));

        let mut faults = self.faults.lock().unwrap();
        let result = match faults.get_mut(action) {
            Some(Fault { message, remaining: None }) => Err(ActuatorError::failed(message.clone())),
            Some(Fault { message, remaining: Some(n) }) if *n > 0 => {
                *n -= 1;
                Err(ActuatorError::failed(message.clone()))
            }
            _ => Ok(json!({"action": action, "target": target})),
        };
        let delay = self.delays.get(action).copied();

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

impl Actuator for MockActuator {
    fn name(&self) -> &str {
        "mock"
    }

    fn supports(&self, action: Action) -> bool {
        action != Action::Authenticate || self.authenticate
    }

    fn navigate(&self, url: &str) -> impl Future<Output = ActionResult> + Send {
        self.respond("navigate", url.to_string())
    }

    fn click(&self, selector: &str) -> impl Future<Output = ActionResult> + Send {
        self.respond("click", selector.to_string())
    }

    fn type_text(&self, selector: &str, text: &str) -> impl Future<Output = ActionResult> + Send {
        self.respond("type", format!("{selector}={text}"))
    }

    fn extract(&self, selector: &str) -> impl Future<Output = ActionResult> + Send {
        self.respond("extract", selector.to_string())
    }

    fn screenshot(&self, path: &str) -> impl Future<Output = ActionResult> + Send {
        self.respond("screenshot", path.to_string())
    }

    fn authenticate(&self, _args: &StepArgs) -> impl Future<Output = ActionResult> + Send {
        self.respond("authenticate", "session".to_string())
    }
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

pub(crate) struct MockOracle {
    intent: Result<OracleIntent, String>,
    advice: Result<RepairAdvice, String>,
    delay: Option<Duration>,
}

impl MockOracle {
    pub fn answering(intent: OracleIntent) -> Self {
        Self {
            intent: Ok(intent),
            advice: Ok(RepairAdvice::default()),
            delay: None,
        }
    }

    pub fn broken(message: &str) -> Self {
        Self {
            intent: Err(message.to_string()),
            advice: Err(message.to_string()),
            delay: None,
        }
    }

    pub fn with_advice(mut self, advice: RepairAdvice) -> Self {
        self.advice = Ok(advice);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Oracle for MockOracle {
    fn name(&self) -> &str {
        "mock-oracle"
    }

    fn parse_prompt(
        &self,
        _prompt: &str,
    ) -> impl Future<Output = Result<OracleIntent, OracleError>> + Send {
        let result = self.intent.clone().map_err(OracleError::Malformed);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }

    fn advise_repair(
        &self,
        _request: &RepairAdviceRequest,
    ) -> impl Future<Output = Result<RepairAdvice, OracleError>> + Send {
        let result = self.advice.clone().map_err(OracleError::Transport);
        async move { result }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub(crate) fn args(value: Value) -> StepArgs {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// `test_navigation`: navigate, screenshot, extract(h1).
pub(crate) fn navigation_workflow() -> WorkflowSpec {
    WorkflowSpec::new("test_navigation")
        .with_domain("example.com")
        .with_step(Step::single("navigate", "url", "https://example.com"))
        .with_step(Step::single("screenshot", "path", "test.png"))
        .with_step(Step::single("extract", "selector", "h1"))
        .with_metadata("description", json!("Simple test workflow"))
}
