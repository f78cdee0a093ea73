//! Infrastructure layer for webpilot.
//!
//! Contains implementations of the ports defined in `webpilot-core`:
//! YAML workflow files, JSON repair-suggestion files, the simulated and
//! HTTP actuators, the OpenAI-compatible oracle, plus configuration loading
//! and data-directory resolution.

pub mod actuator;
pub mod config;
pub mod filesystem;
pub mod oracle;
pub mod storage;
