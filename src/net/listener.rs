//! TCP listener acquisition.
//!
//! # Responsibilities
//! - Resolve the configured host and port into a socket address
//! - Bind the listening socket
//! - Report bind failures as a single error kind
//!
//! Bind failures are never retried: a port that cannot be bound is a
//! configuration problem.

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind {
        address: String,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { address, source } => {
                write!(f, "failed to listen on {}: {}", address, source)
            }
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
        }
    }
}

/// A bound TCP listener, ready to accept.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to the configured host and port.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address = format!("{}:{}", config.host, config.port);
        let bind_err = |source| ListenerError::Bind {
            address: address.clone(),
            source,
        };

        let addr = resolve(config).map_err(bind_err)?;
        let inner = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Hand the socket over to the serve loop.
    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

fn resolve(config: &ListenerConfig) -> Result<SocketAddr, std::io::Error> {
    let port = u16::try_from(config.port).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("port {} out of range", config.port),
        )
    })?;

    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    Ok(SocketAddr::new(ip, port))
}
