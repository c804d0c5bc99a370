//! HTTP server setup and listener bring-up.
//!
//! # Responsibilities
//! - Build the routing table once from the configuration
//! - Compose one handler per listener (headers → gzip → mux)
//! - Wrap it in an Axum router with request IDs and tracing
//! - Load every TLS config, then bind every listener, before serving any
//! - Drain all listeners on shutdown
//!
//! # Design Decisions
//! - Every listener shares the same immutable `Arc<RoutingTable>`
//! - Any build, TLS or bind failure is fatal before traffic is accepted
//! - A listener that stops with an error stops the whole server

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tower::Layer;

use crate::config::{ListenerConfig, Protocol, ServerConfig};
use crate::handlers::{boxed, Handler};
use crate::http::middleware::{inject, GzipLayer, HeaderSet};
use crate::http::request;
use crate::lifecycle::Shutdown;
use crate::net::tls::load_tls_config;
use crate::routing::{BuildError, RoutingTable, StaticMux};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("TLS setup failed for {addr}: {source}")]
    Tls { addr: String, source: io::Error },

    #[error("listener {addr} failed: {source}")]
    Serve { addr: String, source: io::Error },

    #[error("listener task failed: {0}")]
    Join(#[from] JoinError),
}

struct Listener {
    config: ListenerConfig,
    router: Router,
}

/// Static file server over all configured listeners.
pub struct HttpServer {
    table: Arc<RoutingTable>,
    listeners: Vec<Listener>,
}

impl HttpServer {
    /// Build every handler the configuration describes.
    pub fn new(config: &ServerConfig) -> Result<Self, BuildError> {
        let table = Arc::new(RoutingTable::from_config(config)?);
        let listeners = config
            .listeners
            .iter()
            .map(|listener| -> Result<Listener, BuildError> {
                let service = listener_service(&table, config, listener)?;
                Ok(Listener {
                    config: listener.clone(),
                    router: request::instrument(Router::new().fallback_service(service)),
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { table, listeners })
    }

    pub fn table(&self) -> &Arc<RoutingTable> {
        &self.table
    }

    /// Bind every listener and start serving.
    ///
    /// Certificates are loaded before the first socket is bound, so a bad
    /// TLS listener never leaves earlier listeners half started.
    pub async fn start(self, shutdown: &Shutdown) -> Result<RunningServer, ServerError> {
        let mut prepared = Vec::with_capacity(self.listeners.len());
        for listener in self.listeners {
            let tls = match listener.config.protocol {
                Protocol::Http => None,
                Protocol::Https => Some(tls_config(&listener.config).await?),
            };
            prepared.push((listener, tls));
        }

        let mut bound = Vec::with_capacity(prepared.len());
        for (listener, tls) in prepared {
            let addr = listener.config.addr.clone();
            let tcp = TcpListener::bind(&addr)
                .await
                .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;
            let local = tcp
                .local_addr()
                .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;
            bound.push((listener, tcp, local, tls));
        }

        let mut tasks = JoinSet::new();
        let mut addrs = Vec::with_capacity(bound.len());
        for (listener, tcp, local, tls) in bound {
            tracing::info!(
                address = %local,
                protocol = %listener.config.protocol,
                gzip = listener.config.gzip,
                "Listener bound"
            );
            let stop = shutdown.subscribe();
            match tls {
                None => tasks.spawn(serve_http(tcp, listener.router, local, stop)),
                Some(tls) => tasks.spawn(serve_https(tcp, listener.router, local, tls, stop, shutdown.grace())),
            };
            addrs.push(local);
        }

        Ok(RunningServer { addrs, tasks })
    }

    /// Serve until shutdown, or until a listener fails.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), ServerError> {
        self.start(shutdown).await?.wait().await
    }
}

/// Listeners that are accepting connections.
pub struct RunningServer {
    addrs: Vec<SocketAddr>,
    tasks: JoinSet<Result<(), ServerError>>,
}

impl RunningServer {
    /// Bound addresses, in configuration order.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Wait for every listener to stop. The first failure aborts the rest.
    pub async fn wait(mut self) -> Result<(), ServerError> {
        while let Some(joined) = self.tasks.join_next().await {
            joined??;
        }
        Ok(())
    }
}

/// The composed handler of one listener.
pub fn listener_service(
    table: &Arc<RoutingTable>,
    config: &ServerConfig,
    listener: &ListenerConfig,
) -> Result<Handler, BuildError> {
    let mut service = boxed(StaticMux::new(Arc::clone(table), config.override_status));
    if listener.gzip {
        service = boxed(GzipLayer::new().layer(service));
    }
    let headers = HeaderSet::parse(&listener.headers)?;
    Ok(inject(service, &headers))
}

async fn tls_config(listener: &ListenerConfig) -> Result<RustlsConfig, ServerError> {
    let tls_error = |source: io::Error| ServerError::Tls {
        addr: listener.addr.clone(),
        source,
    };
    let (Some(cert), Some(key)) = (&listener.cert, &listener.key) else {
        return Err(tls_error(io::Error::new(
            io::ErrorKind::NotFound,
            "https listener needs both cert and key",
        )));
    };
    load_tls_config(cert, key).await.map_err(tls_error)
}

async fn serve_http(
    tcp: TcpListener,
    router: Router,
    addr: SocketAddr,
    mut stop: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    axum::serve(tcp, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = stop.recv().await;
        })
        .await
        .map_err(|source| ServerError::Serve {
            addr: addr.to_string(),
            source,
        })?;
    tracing::info!(address = %addr, "Listener stopped");
    Ok(())
}

async fn serve_https(
    tcp: TcpListener,
    router: Router,
    addr: SocketAddr,
    tls: RustlsConfig,
    mut stop: broadcast::Receiver<()>,
    grace: Duration,
) -> Result<(), ServerError> {
    let serve_error = |source: io::Error| ServerError::Serve {
        addr: addr.to_string(),
        source,
    };
    let std_listener = tcp.into_std().map_err(serve_error)?;

    let handle = axum_server::Handle::new();
    let trigger = handle.clone();
    tokio::spawn(async move {
        let _ = stop.recv().await;
        trigger.graceful_shutdown(Some(grace));
    });

    axum_server::from_tcp_rustls(std_listener, tls)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(serve_error)?;
    tracing::info!(address = %addr, "Listener stopped");
    Ok(())
}
