//! Configuration types for the mockhost binary.

mod endpoints;
mod listen;

use crate::server::MockServer;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use endpoints::{BearerSpec, EndpointSpec};
pub use listen::ListenConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockHostConfig {
    /// Resource name reported in logs and snapshots.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

fn default_name() -> String {
    "mockhost".to_string()
}

impl Default for MockHostConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            listen: ListenConfig::default(),
            endpoints: Vec::new(),
        }
    }
}

impl MockHostConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: MockHostConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Resource name must not be empty");
        }
        if self.listen.host.trim().is_empty() {
            anyhow::bail!("listen.host must not be empty");
        }

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            endpoint
                .validate()
                .with_context(|| format!("Invalid endpoint #{}", index + 1))?;
        }

        Ok(())
    }

    /// Declare every configured endpoint on `server`.
    pub fn register_endpoints(&self, server: &MockServer) -> Result<(), anyhow::Error> {
        for endpoint in &self.endpoints {
            endpoint
                .register(server)
                .with_context(|| format!("Failed to register endpoint {}", endpoint.path))?;
        }
        Ok(())
    }
}
