//! MockServer: listener lifecycle and route table.

use super::handler::handle_request;
use super::types::ServerError;
use crate::body::EndpointSettings;
use crate::endpoint::{EndpointBuilder, EndpointRoute, RouteKey};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Method;
use hyper_util::rt::TokioIo;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// State shared between the server handle and its connection tasks.
#[derive(Default)]
pub(crate) struct ServerState {
    routes: RwLock<HashMap<RouteKey, Arc<EndpointRoute>>>,
    request_count: AtomicU64,
}

impl ServerState {
    pub(crate) fn route(&self, key: &RouteKey) -> Option<Arc<EndpointRoute>> {
        self.routes.read().get(key).cloned()
    }

    pub(crate) fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// A running mock HTTP server.
///
/// The server starts listening when constructed. [`shutdown`] stops it and
/// returns once the port is released; [`stop`] and dropping only signal the
/// accept loop. Routes can be added at any time with [`endpoint`].
///
/// [`shutdown`]: MockServer::shutdown
/// [`stop`]: MockServer::stop
/// [`endpoint`]: MockServer::endpoint
pub struct MockServer {
    address: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: broadcast::Sender<()>,
    stopped: AtomicBool,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl MockServer {
    /// Start on `127.0.0.1:port`. Port 0 picks a free ephemeral port.
    pub async fn start(port: u16) -> Result<Self, ServerError> {
        Self::start_on("127.0.0.1", port).await
    }

    /// Start on an explicit host and port.
    pub async fn start_on(host: &str, port: u16) -> Result<Self, ServerError> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| ServerError::BindError(format!("{host}:{port}"), e.to_string()))?;
        let address = listener.local_addr().map_err(ServerError::LocalAddr)?;
        info!("Mock server bound to {}", address);

        let state = Arc::new(ServerState::default());
        let (shutdown_tx, _) = broadcast::channel(1);

        let accept_task = tokio::spawn(serve(
            listener,
            Arc::clone(&state),
            shutdown_tx.clone(),
            shutdown_tx.subscribe(),
        ));

        Ok(Self {
            address,
            state,
            shutdown_tx,
            stopped: AtomicBool::new(false),
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    /// Begin declaring an endpoint at `path`.
    pub fn endpoint(&self, path: impl Into<String>) -> EndpointBuilder<'_> {
        EndpointBuilder::new(self, path, EndpointSettings::default())
    }

    /// Begin declaring an endpoint with custom serialization settings.
    pub fn endpoint_with_settings(
        &self,
        path: impl Into<String>,
        settings: EndpointSettings,
    ) -> EndpointBuilder<'_> {
        EndpointBuilder::new(self, path, settings)
    }

    /// Register a bound route. A later registration for the same
    /// (method, path) replaces the earlier one.
    pub(crate) fn register(&self, route: EndpointRoute) {
        let key = route.key().clone();
        let previous = self.state.routes.write().insert(key.clone(), Arc::new(route));
        if previous.is_some() {
            warn!("Route {} replaced by a later registration", key);
        } else {
            debug!("Registered route {}", key);
        }
    }

    /// Look up the route bound to an exact (method, path).
    pub fn route(&self, method: Method, path: &str) -> Option<Arc<EndpointRoute>> {
        self.state.route(&RouteKey::new(method, path))
    }

    pub fn route_count(&self) -> usize {
        self.state.routes.read().len()
    }

    /// Requests received, matched or not.
    pub fn request_count(&self) -> u64 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Base URL clients should use. An unspecified bind address maps to
    /// loopback.
    pub fn url(&self) -> String {
        if self.address.ip().is_unspecified() {
            format!("http://127.0.0.1:{}", self.address.port())
        } else {
            format!("http://{}", self.address)
        }
    }

    pub fn is_started(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Signal the accept loop and open connections to stop. Calling it again
    /// is a no-op. The listener is closed asynchronously; use [`shutdown`] to
    /// wait for the port to be released.
    ///
    /// [`shutdown`]: MockServer::shutdown
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        // No receivers only means the accept loop already exited.
        let _ = self.shutdown_tx.send(());
        info!("Mock server on {} stopped", self.address);
    }

    /// Stop the server and wait for the accept loop to drop its listener.
    /// Once this returns the port can be bound again.
    pub async fn shutdown(&self) {
        self.stop();
        let accept_task = self.accept_task.lock().take();
        if let Some(accept_task) = accept_task {
            if let Err(e) = accept_task.await {
                warn!("Accept loop on {} ended abnormally: {}", self.address, e);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn shared_state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for MockServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockServer")
            .field("address", &self.address)
            .field("routes", &self.route_count())
            .field("started", &self.is_started())
            .finish()
    }
}

async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let port = listener.local_addr().map(|a| a.port()).unwrap_or_default();
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        let state = Arc::clone(&state);
                        let mut connection_shutdown = shutdown_tx.subscribe();
                        tokio::spawn(async move {
                            let io = TokioIo::new(stream);
                            let service = service_fn(move |req| {
                                let state = Arc::clone(&state);
                                async move { handle_request(req, state).await }
                            });
                            let connection = http1::Builder::new().serve_connection(io, service);
                            tokio::select! {
                                result = connection => {
                                    if let Err(e) = result {
                                        debug!("Connection error from {} on port {}: {}", addr, port, e);
                                    }
                                }
                                _ = connection_shutdown.recv() => {
                                    debug!("Closing connection from {} on port {}", addr, port);
                                }
                            }
                        });
                    }
                    Err(e) => {
                        error!("Accept error on port {}: {}", port, e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Mock server on port {} shutting down", port);
                break;
            }
        }
    }
}
