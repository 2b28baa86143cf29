//! Listener configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind. 0 picks a free ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl ListenConfig {
    /// Loopback listener on `port`.
    pub fn local(port: u16) -> Self {
        Self {
            host: default_host(),
            port,
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self::local(default_port())
    }
}
