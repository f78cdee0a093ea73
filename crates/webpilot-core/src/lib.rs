//! Business logic and port definitions for webpilot.
//!
//! This crate defines the "ports" (repository, actuator and oracle traits)
//! that the infrastructure layer implements, plus the four components built
//! on top of them: `WorkflowStore`, `ExecutionEngine`, `PromptRouter` and
//! `SelfHealingEngine`. It depends only on `webpilot-types` -- never on
//! `webpilot-infra`, the filesystem, or the network.

pub mod actuator;
pub mod engine;
pub mod healing;
pub mod oracle;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
