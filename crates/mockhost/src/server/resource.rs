//! Named, lifecycle-tracked wrapper around a mock server.
//!
//! A resource is what an orchestration host sees: a name, a state, a port
//! and a connection string. Starting a resource binds the server and runs a
//! configuration callback that declares its endpoints.

use super::core::MockServer;
use super::types::{ResourceSnapshot, ResourceState};
use crate::config::ListenConfig;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{error, info};

pub struct MockResource {
    snapshot: RwLock<ResourceSnapshot>,
    server: Option<MockServer>,
}

impl MockResource {
    /// Bind a server for `listen` and run `configure` against it.
    ///
    /// Never fails outright: a bind or configuration failure leaves the
    /// resource in [`ResourceState::Error`] with the message recorded.
    pub async fn start<F>(name: impl Into<String>, listen: &ListenConfig, configure: F) -> Self
    where
        F: FnOnce(&MockServer) -> anyhow::Result<()>,
    {
        let mut snapshot = ResourceSnapshot::new(name, listen.port);

        let server = match MockServer::start_on(&listen.host, listen.port).await {
            Ok(server) => server,
            Err(e) => {
                error!("Resource '{}' failed to start: {}", snapshot.name, e);
                snapshot.state = ResourceState::Error;
                snapshot.error = Some(e.to_string());
                return Self {
                    snapshot: RwLock::new(snapshot),
                    server: None,
                };
            }
        };

        snapshot.port = server.port();
        snapshot.url = Some(server.url());

        if let Err(e) = configure(&server) {
            error!("Resource '{}' configuration failed: {:#}", snapshot.name, e);
            server.shutdown().await;
            snapshot.state = ResourceState::Error;
            snapshot.error = Some(format!("{e:#}"));
            snapshot.stopped_at = Some(Utc::now());
            return Self {
                snapshot: RwLock::new(snapshot),
                server: Some(server),
            };
        }

        snapshot.state = ResourceState::Running;
        snapshot.started_at = Some(Utc::now());
        info!(
            "Resource '{}' running at {} with {} routes",
            snapshot.name,
            server.url(),
            server.route_count()
        );

        Self {
            snapshot: RwLock::new(snapshot),
            server: Some(server),
        }
    }

    pub fn name(&self) -> String {
        self.snapshot.read().name.clone()
    }

    pub fn state(&self) -> ResourceState {
        self.snapshot.read().state
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        self.snapshot.read().clone()
    }

    /// The underlying server, absent when binding failed.
    pub fn server(&self) -> Option<&MockServer> {
        self.server.as_ref()
    }

    /// Base URL of the running server, usable as a connection string.
    pub fn connection_string(&self) -> Option<String> {
        match self.state() {
            ResourceState::Running => self.server.as_ref().map(MockServer::url),
            _ => None,
        }
    }

    /// Stop the server and wait until its port is released. Only a running
    /// resource transitions to [`ResourceState::Stopped`]; other states are
    /// left as they are.
    pub async fn stop(&self) {
        {
            let mut snapshot = self.snapshot.write();
            if snapshot.state != ResourceState::Running {
                return;
            }
            snapshot.state = ResourceState::Stopped;
            snapshot.stopped_at = Some(Utc::now());
        }

        if let Some(server) = &self.server {
            server.shutdown().await;
        }
        info!("Resource '{}' stopped", self.name());
    }
}
