//! Server error and resource state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {0}: {1}")]
    BindError(String, String),
    #[error("Failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Lifecycle state of a [`super::MockResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    NotStarted,
    Running,
    Error,
    Stopped,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ResourceState::NotStarted => "NotStarted",
            ResourceState::Running => "Running",
            ResourceState::Error => "Error",
            ResourceState::Stopped => "Stopped",
        };
        f.write_str(state)
    }
}

/// Point-in-time view of a resource, as shown to an orchestration host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub name: String,
    pub resource_type: String,
    pub state: ResourceState,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
}

impl ResourceSnapshot {
    pub(crate) fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            resource_type: "MockServer".to_string(),
            state: ResourceState::NotStarted,
            port,
            url: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            stopped_at: None,
        }
    }
}
