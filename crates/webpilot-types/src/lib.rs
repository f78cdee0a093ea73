//! Shared domain types for webpilot.
//!
//! This crate contains the domain types used across the workspace: workflow
//! definitions, execution outcomes, failure and repair records, routing
//! results, configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod execution;
pub mod healing;
pub mod oracle;
pub mod routing;
pub mod workflow;
