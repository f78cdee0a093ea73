//! Capability providers implementing [`webpilot_core::actuator::Actuator`].
//!
//! - [`SimulatedActuator`]: offline provider returning canned results.
//! - [`RemoteActuator`]: forwards each action to an HTTP endpoint.

pub mod remote;
pub mod simulated;

pub use remote::RemoteActuator;
pub use simulated::SimulatedActuator;

use webpilot_core::actuator::BoxActuator;
use webpilot_types::config::ActuatorConfig;

/// Pick the provider for the given configuration: remote when an endpoint is
/// configured, simulated otherwise.
pub fn build_actuator(config: &ActuatorConfig) -> BoxActuator {
    match config.endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => {
            tracing::info!(endpoint, "using remote actuator");
            BoxActuator::new(RemoteActuator::new(endpoint.to_string(), config.timeout_secs))
        }
        _ => {
            tracing::info!("no actuator endpoint configured, using simulated actuator");
            BoxActuator::new(SimulatedActuator::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_actuator_selects_provider() {
        let mut config = ActuatorConfig::default();
        assert_eq!(build_actuator(&config).name(), "simulated");

        config.endpoint = Some("   ".to_string());
        assert_eq!(build_actuator(&config).name(), "simulated");

        config.endpoint = Some("http://127.0.0.1:9000/actions".to_string());
        assert_eq!(build_actuator(&config).name(), "remote");
    }
}
