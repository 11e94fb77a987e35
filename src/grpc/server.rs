//! gRPC server construction, registration and the serve loop.
//!
//! # Responsibilities
//! - Build the server from `ServerOptions`
//! - Attach exactly one management service under its gRPC name
//! - Run the accept/dispatch loop on a bound listener until told to stop
//!
//! # Design Decisions
//! - `serve` consumes the instance, so a server cannot be started twice
//! - A second `register` is rejected and leaves the first service in place
//! - Every call gets a tracing span via `TraceLayer::new_for_grpc`
//! - Every call is counted by the instance's `CallTracker`

use std::future::Future;

use thiserror::Error;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::server::NamedService;
use tonic::service::Routes;
use tonic::transport::Server;
use tower_http::trace::TraceLayer;

use crate::config::ServerOptions;
use crate::grpc::calls::{CallTracker, TrackedService};
use crate::grpc::proto::management_service_server::{ManagementService, ManagementServiceServer};
use crate::net::Listener;

/// Errors raised while attaching a service.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The instance already carries a service.
    #[error("service {name} is already registered")]
    AlreadyRegistered { name: &'static str },
}

/// Errors that end the serve loop abnormally.
#[derive(Debug, Error)]
pub enum ServeError {
    /// `serve` was called before any service was registered.
    #[error("no service registered")]
    NotRegistered,

    /// The transport failed while serving.
    #[error("failed to serve: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The loop returned although nobody asked it to stop.
    #[error("serve loop exited before shutdown was requested")]
    UnexpectedExit,

    /// The serve task panicked or was cancelled.
    #[error("serve task aborted: {0}")]
    Aborted(String),
}

/// The RPC server object: options plus the registered service.
pub struct ServerInstance {
    options: ServerOptions,
    routes: Option<Routes>,
    service_name: Option<&'static str>,
    calls: CallTracker,
}

impl ServerInstance {
    /// Create an empty server instance.
    pub fn new(options: ServerOptions) -> Self {
        Self {
            options,
            routes: None,
            service_name: None,
            calls: CallTracker::new(),
        }
    }

    /// Attach the management service.
    pub fn register<T: ManagementService>(&mut self, service: T) -> Result<(), RegistrationError> {
        if let Some(name) = self.service_name {
            return Err(RegistrationError::AlreadyRegistered { name });
        }

        let name = <ManagementServiceServer<T> as NamedService>::NAME;
        let tracked = TrackedService::new(service, self.calls.clone());
        self.routes = Some(Routes::new(ManagementServiceServer::new(tracked)));
        self.service_name = Some(name);

        tracing::debug!(service = name, "Service registered");
        Ok(())
    }

    /// Name of the registered service, if any.
    pub fn service_name(&self) -> Option<&'static str> {
        self.service_name
    }

    /// Tracker counting calls in flight inside the registered service.
    pub fn calls(&self) -> CallTracker {
        self.calls.clone()
    }

    /// Serve on `listener` until `stop` resolves.
    ///
    /// In-flight calls are allowed to finish after `stop` resolves; bounding
    /// that wait is the caller's job. The listener is closed on return.
    pub async fn serve<F>(self, listener: Listener, stop: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let routes = self.routes.ok_or(ServeError::NotRegistered)?;
        let local_addr = listener.local_addr();
        let incoming = TcpListenerStream::new(listener.into_inner());

        let mut builder = Server::builder();
        if let Some(timeout) = self.options.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(limit) = self.options.concurrency_limit_per_connection {
            builder = builder.concurrency_limit_per_connection(limit);
        }

        tracing::info!(
            address = %local_addr,
            service = self.service_name.unwrap_or_default(),
            "gRPC server starting"
        );

        let router = builder.layer(TraceLayer::new_for_grpc()).add_routes(routes);
        router.serve_with_incoming_shutdown(incoming, stop).await?;

        tracing::info!("gRPC server stopped");
        Ok(())
    }
}
