//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (webpilot-infra) implements. The core crate never depends on any
//! specific storage technology.
//!
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).

use std::future::Future;

use webpilot_types::error::StoreError;
use webpilot_types::healing::{Failure, RepairSuggestion};
use webpilot_types::workflow::WorkflowSpec;

/// Persistence for workflow definitions, one record per workflow name.
pub trait WorkflowRepository: Send + Sync {
    /// Read every persisted definition. Malformed records are skipped by the
    /// implementation, never returned as an error.
    fn load_all(&self) -> impl Future<Output = Result<Vec<WorkflowSpec>, StoreError>> + Send;

    /// Upsert a definition by name. Must not leave a partially written record.
    fn save(&self, spec: &WorkflowSpec) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Persistence for the self-healing records: repair suggestions awaiting
/// review and the append-only failure log.
pub trait SuggestionRepository: Send + Sync {
    /// Upsert a suggestion keyed by [`RepairSuggestion::record_key`].
    fn save(
        &self,
        suggestion: &RepairSuggestion,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn load_all(&self) -> impl Future<Output = Result<Vec<RepairSuggestion>, StoreError>> + Send;

    fn append_failure(
        &self,
        failure: &Failure,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn load_failures(&self) -> impl Future<Output = Result<Vec<Failure>, StoreError>> + Send;
}
