//! HTTP listener lifecycle: background start and deadline-bounded graceful stop.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use super::handlers::AppState;
use super::routes::{create_router, MAX_HEADER_BYTES, REQUEST_TIMEOUT};
use crate::error::ServerError;
use crate::manager::ConfigManager;
use crate::registry::Registry;

/// Per-connection read buffer: the header cap plus room for the request line.
const READ_BUFFER_BYTES: usize = MAX_HEADER_BYTES + 64 * 1024;

/// Pause after a failed accept so a persistent error does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP API server over a provider registry and configuration manager.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    shutdown_timeout: Duration,
    header_read_timeout: Duration,
    state: AppState,
    running: Mutex<Option<RunningServer>>,
}

#[derive(Debug)]
struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Server {
    /// Create a server that will listen on all interfaces at `port`.
    ///
    /// Nothing is bound until [`Server::start`].
    pub fn new(
        registry: Arc<Registry>,
        config_manager: Arc<ConfigManager>,
        port: u16,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            shutdown_timeout,
            header_read_timeout: REQUEST_TIMEOUT,
            state: AppState::new(registry, config_manager),
            running: Mutex::new(None),
        }
    }

    /// Bind to `host` instead of all interfaces.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.addr.set_ip(host);
        self
    }

    /// Override how long a client may take to send its request head.
    pub fn with_header_read_timeout(mut self, timeout: Duration) -> Self {
        self.header_read_timeout = timeout;
        self
    }

    /// Configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Configured shutdown grace period.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Time allowed for reading a request head.
    pub fn header_read_timeout(&self) -> Duration {
        self.header_read_timeout
    }

    /// Address the listener is bound to while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|running| running.addr)
    }

    /// Router serving this server's endpoints, for driving without a socket.
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Bind the listener and serve on a background task.
    ///
    /// Returns as soon as the socket is bound. Errors from the serve loop after
    /// that point are logged only.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            return Err(ServerError::AlreadyRunning { addr: current.addr });
        }

        info!(addr = %self.addr, "Starting HTTP API server");

        let addr = self.addr;
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            error!(addr = %addr, error = %source, "HTTP server bind error");
            ServerError::Bind { addr, source }
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let router = create_router(self.state.clone());
        let handle = tokio::spawn(accept_loop(
            listener,
            router,
            self.header_read_timeout,
            shutdown_rx,
        ));

        self.state.mark_started().await;
        info!(addr = %local_addr, "HTTP server listening");

        *running = Some(RunningServer {
            addr: local_addr,
            shutdown_tx,
            handle,
        });

        Ok(local_addr)
    }

    /// Gracefully stop, waiting at most the configured grace period.
    pub async fn stop(&self) -> Result<(), ServerError> {
        self.stop_within(self.shutdown_timeout).await
    }

    /// Gracefully stop, waiting at most `budget` (capped by the grace period).
    ///
    /// New connections are refused immediately and in-flight requests get until
    /// the deadline to finish; whatever is left then is abandoned. A zero budget
    /// still signals shutdown and returns without waiting.
    pub async fn stop_within(&self, budget: Duration) -> Result<(), ServerError> {
        let Some(running) = self.running.lock().await.take() else {
            debug!("HTTP API server not running");
            return Ok(());
        };

        info!(addr = %running.addr, "Stopping HTTP API server");

        let waited = budget.min(self.shutdown_timeout);
        // Err only if the accept loop already exited.
        let _ = running.shutdown_tx.send(true);

        let mut handle = running.handle;
        match tokio::time::timeout(waited, &mut handle).await {
            Ok(Ok(())) => {
                info!("HTTP API server stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "HTTP server shutdown error");
                Err(ServerError::Join(e))
            }
            Err(_) => {
                // Dropping the accept loop's JoinSet aborts the open connections.
                handle.abort();
                error!(waited = ?waited, "HTTP server shutdown error: deadline exceeded");
                Err(ServerError::ShutdownTimeout { waited })
            }
        }
    }
}

/// Accept connections until shutdown is signalled, then drain the open ones.
async fn accept_loop(
    listener: TcpListener,
    router: Router,
    header_read_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        router.clone(),
                        header_read_timeout,
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    error!(error = %e, "HTTP server error: accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
            _ = shutdown.changed() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    debug!(open = connections.len(), "Draining HTTP connections");
    while connections.join_next().await.is_some() {}
}

/// Serve one connection, switching it to graceful close once shutdown starts.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    header_read_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(header_read_timeout)
        .max_buf_size(READ_BUFFER_BYTES);

    let conn = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(router));
    tokio::pin!(conn);

    let mut draining = *shutdown.borrow();
    if draining {
        conn.as_mut().graceful_shutdown();
    }

    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    debug!(peer = %peer, error = %e, "HTTP connection closed with error");
                }
                break;
            }
            _ = shutdown.changed(), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}
