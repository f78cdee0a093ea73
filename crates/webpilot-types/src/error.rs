use thiserror::Error;

/// Errors from workflow and suggestion persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid workflow name: {0}")]
    InvalidName(String),

    #[error("workflow '{0}' not found")]
    NotFound(String),
}

/// Failure of a single step. Captured into the step outcome, never raised
/// out of a workflow run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepError {
    /// The action is not part of the registered action set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The step arguments do not have the shape the action needs.
    #[error("invalid arguments for '{action}': {message}")]
    InvalidArgs { action: String, message: String },

    /// The actuator reported a failure.
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}

impl StepError {
    /// Short name of the error category, recorded on failure records.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::UnknownCommand(_) => "UnknownCommand",
            StepError::InvalidArgs { .. } => "ValidationError",
            StepError::Actuator(_) => "ActuatorError",
        }
    }
}

/// Failure reported by the capability provider, carrying its message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActuatorError {
    #[error("{0}")]
    Failed(String),

    #[error("action '{0}' is not supported by this actuator")]
    Unsupported(String),

    #[error("timeout after {0}s")]
    Timeout(u64),

    #[error("actuator transport error: {0}")]
    Transport(String),
}

impl ActuatorError {
    pub fn failed(message: impl Into<String>) -> Self {
        ActuatorError::Failed(message.into())
    }
}

/// Errors from a workflow run that are returned to the caller rather than
/// captured into a step outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("workflow '{0}' not found")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the language-model oracle. Always recoverable: callers degrade
/// to a deterministic strategy.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unavailable")]
    Unavailable,

    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle returned a malformed response: {0}")]
    Malformed(String),

    #[error("oracle timed out after {0}ms")]
    Timeout(u64),
}

/// Errors from applying or discarding a repair suggestion.
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("repair requires human approval")]
    ApprovalRequired,

    #[error("repair suggestion '{0}' not found")]
    SuggestionNotFound(String),

    #[error("workflow '{0}' not found")]
    WorkflowNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
