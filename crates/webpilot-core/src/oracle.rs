//! Oracle trait definition and its type-erased wrapper.
//!
//! The oracle is a language-model client used for prompt parsing and repair
//! advice. Every call may time out or return garbage; callers always hold a
//! deterministic fallback.

use std::future::Future;
use std::pin::Pin;

use webpilot_types::error::OracleError;
use webpilot_types::oracle::{OracleIntent, RepairAdvice, RepairAdviceRequest};

/// Trait for language-model backends.
///
/// Implementations live in webpilot-infra (e.g., `OpenAiOracle`).
pub trait Oracle: Send + Sync {
    fn name(&self) -> &str;

    /// Extract `{site, intent, variables}` from a natural-language prompt.
    fn parse_prompt(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<OracleIntent, OracleError>> + Send;

    /// Suggest a fix for a failing step.
    fn advise_repair(
        &self,
        request: &RepairAdviceRequest,
    ) -> impl Future<Output = Result<RepairAdvice, OracleError>> + Send;
}

/// Object-safe version of [`Oracle`] with boxed futures.
pub trait OracleDyn: Send + Sync {
    fn name(&self) -> &str;

    fn parse_prompt_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<OracleIntent, OracleError>> + Send + 'a>>;

    fn advise_repair_boxed<'a>(
        &'a self,
        request: &'a RepairAdviceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RepairAdvice, OracleError>> + Send + 'a>>;
}

impl<T: Oracle> OracleDyn for T {
    fn name(&self) -> &str {
        Oracle::name(self)
    }

    fn parse_prompt_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<OracleIntent, OracleError>> + Send + 'a>> {
        Box::pin(self.parse_prompt(prompt))
    }

    fn advise_repair_boxed<'a>(
        &'a self,
        request: &'a RepairAdviceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RepairAdvice, OracleError>> + Send + 'a>> {
        Box::pin(self.advise_repair(request))
    }
}

/// Type-erased oracle, so the router and the healer can hold "some oracle"
/// without being generic over it.
pub struct BoxOracle {
    inner: Box<dyn OracleDyn + Send + Sync>,
}

impl BoxOracle {
    pub fn new<T: Oracle + 'static>(oracle: T) -> Self {
        Self {
            inner: Box::new(oracle),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn parse_prompt(&self, prompt: &str) -> Result<OracleIntent, OracleError> {
        self.inner.parse_prompt_boxed(prompt).await
    }

    pub async fn advise_repair(
        &self,
        request: &RepairAdviceRequest,
    ) -> Result<RepairAdvice, OracleError> {
        self.inner.advise_repair_boxed(request).await
    }
}
