//! Actuator trait definition and the typed command set it executes.
//!
//! The actuator is the external capability provider that performs browser
//! actions. Steps name their action as a string in workflow files; before
//! anything reaches the actuator the string is resolved into a [`Command`],
//! so unknown actions and malformed arguments are rejected up front.
//!
//! Like the oracle, `Actuator` uses RPITIT and therefore cannot be a trait
//! object. [`BoxActuator`] provides runtime selection (simulated vs remote)
//! through an object-safe [`ActuatorDyn`] with a blanket impl.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use webpilot_types::error::{ActuatorError, StepError};
use webpilot_types::workflow::{Action, StepArgs};

/// Data returned by a successful action, or the provider's failure.
pub type ActionResult = Result<Value, ActuatorError>;

/// Screenshot path used when a step does not name one.
pub const DEFAULT_SCREENSHOT_PATH: &str = "screenshot.png";

// ---------------------------------------------------------------------------
// Actuator trait
// ---------------------------------------------------------------------------

/// Trait for capability providers that drive a browser.
///
/// One method per action. `authenticate` is optional: providers that
/// implement it must also report it from [`Actuator::supports`].
pub trait Actuator: Send + Sync {
    /// Human-readable provider name (e.g., "simulated", "remote").
    fn name(&self) -> &str;

    /// Whether this provider has a handler for `action`.
    fn supports(&self, action: Action) -> bool {
        action != Action::Authenticate
    }

    fn navigate(&self, url: &str) -> impl Future<Output = ActionResult> + Send;

    fn click(&self, selector: &str) -> impl Future<Output = ActionResult> + Send;

    fn type_text(&self, selector: &str, text: &str) -> impl Future<Output = ActionResult> + Send;

    fn extract(&self, selector: &str) -> impl Future<Output = ActionResult> + Send;

    fn screenshot(&self, path: &str) -> impl Future<Output = ActionResult> + Send;

    fn authenticate(&self, _args: &StepArgs) -> impl Future<Output = ActionResult> + Send {
        async { Err(ActuatorError::Unsupported(Action::Authenticate.to_string())) }
    }

    /// Block until the current page reports it has finished loading.
    fn wait_for_load(&self) -> impl Future<Output = Result<(), ActuatorError>> + Send {
        async { Ok(()) }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A fully resolved action invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Navigate { url: String },
    Click { selector: String },
    Type { selector: String, text: String },
    Extract { selector: String },
    Screenshot { path: String },
    Authenticate { args: StepArgs },
}

impl Command {
    /// Resolve an action name and its (already substituted) arguments.
    pub fn from_args(action: &str, args: &StepArgs) -> Result<Self, StepError> {
        let action: Action = action.parse()?;
        let command = match action {
            Action::Navigate => Command::Navigate {
                url: required(action, args, "url")?,
            },
            Action::Click => Command::Click {
                selector: required(action, args, "selector")?,
            },
            Action::Type => Command::Type {
                selector: required(action, args, "selector")?,
                text: required(action, args, "text")?,
            },
            Action::Extract => Command::Extract {
                selector: required(action, args, "selector")?,
            },
            Action::Screenshot => Command::Screenshot {
                path: optional(action, args, "path")?
                    .unwrap_or_else(|| DEFAULT_SCREENSHOT_PATH.to_string()),
            },
            Action::Authenticate => Command::Authenticate { args: args.clone() },
        };
        Ok(command)
    }

    pub fn action(&self) -> Action {
        match self {
            Command::Navigate { .. } => Action::Navigate,
            Command::Click { .. } => Action::Click,
            Command::Type { .. } => Action::Type,
            Command::Extract { .. } => Action::Extract,
            Command::Screenshot { .. } => Action::Screenshot,
            Command::Authenticate { .. } => Action::Authenticate,
        }
    }
}

fn required(action: Action, args: &StepArgs, key: &str) -> Result<String, StepError> {
    optional(action, args, key)?.ok_or_else(|| StepError::InvalidArgs {
        action: action.to_string(),
        message: format!("missing '{key}'"),
    })
}

/// Scalars are accepted and rendered as text; arrays and objects are not.
fn optional(action: Action, args: &StepArgs, key: &str) -> Result<Option<String>, StepError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(_) => Err(StepError::InvalidArgs {
            action: action.to_string(),
            message: format!("'{key}' must be a string"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Dynamic dispatch
// ---------------------------------------------------------------------------

/// Object-safe version of [`Actuator`] with boxed futures.
///
/// A blanket implementation is provided for all types implementing `Actuator`.
pub trait ActuatorDyn: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, action: Action) -> bool;

    fn execute_boxed<'a>(
        &'a self,
        command: &'a Command,
    ) -> Pin<Box<dyn Future<Output = ActionResult> + Send + 'a>>;

    fn wait_for_load_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<(), ActuatorError>> + Send + '_>>;
}

impl<T: Actuator> ActuatorDyn for T {
    fn name(&self) -> &str {
        Actuator::name(self)
    }

    fn supports(&self, action: Action) -> bool {
        Actuator::supports(self, action)
    }

    fn execute_boxed<'a>(
        &'a self,
        command: &'a Command,
    ) -> Pin<Box<dyn Future<Output = ActionResult> + Send + 'a>> {
        match command {
            Command::Navigate { url } => Box::pin(self.navigate(url)),
            Command::Click { selector } => Box::pin(self.click(selector)),
            Command::Type { selector, text } => Box::pin(self.type_text(selector, text)),
            Command::Extract { selector } => Box::pin(self.extract(selector)),
            Command::Screenshot { path } => Box::pin(self.screenshot(path)),
            Command::Authenticate { args } => Box::pin(self.authenticate(args)),
        }
    }

    fn wait_for_load_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<(), ActuatorError>> + Send + '_>> {
        Box::pin(self.wait_for_load())
    }
}

/// Type-erased actuator for runtime provider selection.
pub struct BoxActuator {
    inner: Box<dyn ActuatorDyn + Send + Sync>,
}

impl BoxActuator {
    pub fn new<T: Actuator + 'static>(actuator: T) -> Self {
        Self {
            inner: Box::new(actuator),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn supports(&self, action: Action) -> bool {
        self.inner.supports(action)
    }

    /// Run a resolved command against the wrapped provider.
    pub async fn execute(&self, command: &Command) -> ActionResult {
        self.inner.execute_boxed(command).await
    }

    pub async fn wait_for_load(&self) -> Result<(), ActuatorError> {
        self.inner.wait_for_load_boxed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockActuator;
    use serde_json::json;

    fn args(value: Value) -> StepArgs {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_args_resolves_each_action() {
        let cmd = Command::from_args("navigate", &args(json!({"url": "https://x.com"}))).unwrap();
        assert_eq!(cmd, Command::Navigate { url: "https://x.com".to_string() });

        let cmd = Command::from_args(
            "type",
            &args(json!({"selector": "#q", "text": "rust"})),
        )
        .unwrap();
        assert_eq!(cmd.action(), Action::Type);

        let cmd = Command::from_args("screenshot", &StepArgs::new()).unwrap();
        assert_eq!(cmd, Command::Screenshot { path: "screenshot.png".to_string() });
    }

    #[test]
    fn test_from_args_rejects_unknown_action() {
        let err = Command::from_args("hover", &StepArgs::new()).unwrap_err();
        assert_eq!(err.to_string(), "unknown command: hover");
    }

    #[test]
    fn test_from_args_validates_argument_shape() {
        let err = Command::from_args("click", &StepArgs::new()).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");

        let err = Command::from_args("extract", &args(json!({"selector": ["a"]}))).unwrap_err();
        assert!(err.to_string().contains("must be a string"));

        let cmd = Command::from_args("type", &args(json!({"selector": "#n", "text": 42}))).unwrap();
        assert_eq!(
            cmd,
            Command::Type { selector: "#n".to_string(), text: "42".to_string() }
        );
    }

    #[tokio::test]
    async fn test_box_actuator_dispatches_to_provider() {
        let mock = MockActuator::new();
        let calls = mock.calls();
        let actuator = BoxActuator::new(mock);

        assert_eq!(actuator.name(), "mock");
        assert!(!actuator.supports(Action::Authenticate));

        let data = actuator
            .execute(&Command::Extract { selector: "h1".to_string() })
            .await
            .unwrap();
        assert_eq!(data, json!({"action": "extract", "target": "h1"}));
        assert_eq!(calls.lock().unwrap().as_slice(), ["extract h1"]);
    }

    /// Implements only the required actions, leaving trait defaults in place.
    struct NavigateOnly;

    impl Actuator for NavigateOnly {
        fn name(&self) -> &str {
            "navigate-only"
        }

        async fn navigate(&self, url: &str) -> ActionResult {
            Ok(json!({"url": url}))
        }

        async fn click(&self, _selector: &str) -> ActionResult {
            Err(ActuatorError::Unsupported("click".to_string()))
        }

        async fn type_text(&self, _selector: &str, _text: &str) -> ActionResult {
            Err(ActuatorError::Unsupported("type".to_string()))
        }

        async fn extract(&self, _selector: &str) -> ActionResult {
            Err(ActuatorError::Unsupported("extract".to_string()))
        }

        async fn screenshot(&self, _path: &str) -> ActionResult {
            Err(ActuatorError::Unsupported("screenshot".to_string()))
        }
    }

    #[tokio::test]
    async fn test_default_authenticate_is_unsupported() {
        let actuator = BoxActuator::new(NavigateOnly);
        assert!(!actuator.supports(Action::Authenticate));
        assert!(actuator.supports(Action::Navigate));
        let err = actuator
            .execute(&Command::Authenticate { args: StepArgs::new() })
            .await
            .unwrap_err();
        assert_eq!(err, ActuatorError::Unsupported("authenticate".to_string()));
    }
}
