//! Orchestrator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deployer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    /// Per-step confirmation timeout in seconds
    ///
    /// Off by default. When set, the client is wrapped in a
    /// [`TimeoutClient`](crate::TimeoutClient); a timed out step has an
    /// unknown outcome on the environment's side.
    pub step_timeout_secs: Option<u64>,
    /// Reject the whole plan up front if any step is malformed
    pub validate_before_deploy: bool,
}

impl DeployerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With per-step timeout
    #[inline]
    #[must_use]
    pub fn with_step_timeout(mut self, secs: u64) -> Self {
        self.step_timeout_secs = Some(secs);
        self
    }

    /// Without per-step timeout
    #[inline]
    #[must_use]
    pub fn without_step_timeout(mut self) -> Self {
        self.step_timeout_secs = None;
        self
    }

    /// With or without up-front validation
    #[inline]
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_before_deploy = validate;
        self
    }

    #[must_use]
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: None,
            validate_before_deploy: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let config = DeployerConfig::new();
        assert_eq!(config.step_timeout(), None);
        assert!(config.validate_before_deploy);

        let config = config.with_step_timeout(300).with_validation(false);
        assert_eq!(config.step_timeout(), Some(Duration::from_secs(300)));
        assert!(!config.validate_before_deploy);
        assert_eq!(config.without_step_timeout().step_timeout(), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DeployerConfig = serde_json::from_str(r#"{"step_timeout_secs": 5}"#).unwrap();
        assert_eq!(config.step_timeout_secs, Some(5));
        assert!(config.validate_before_deploy);
    }
}
