//! Startup orchestration and the process-lifetime wait.
//!
//! # Responsibilities
//! - Bind the listener, register the service, arm signal handling
//! - Spawn the serve loop and confirm it is running
//! - Block the caller until the serve loop ends, bounding shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned, nothing is retried
//! - Signal handlers are installed before the serve task is spawned
//! - `start` returns only once the serve task runs; traffic is expected after that
//! - First signal drains for the grace period, a second one forces exit
//! - Draining waits for in-flight calls, not for idle connections

/// How long idle connections get to close once no call is in flight.
const IDLE_CLOSE_WINDOW: Duration = Duration::from_millis(250);

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::config::ManagementConfig;
use crate::grpc::proto::management_service_server::ManagementService;
use crate::grpc::{CallTracker, ServeError, ServerInstance};
use crate::lifecycle::shutdown::{Shutdown, ShutdownPhase};
use crate::lifecycle::signals::ShutdownSignals;
use crate::lifecycle::LifecycleError;
use crate::net::Listener;

/// Builds and starts the management server from an explicit configuration.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: ManagementConfig,
}

impl Bootstrap {
    pub fn new(config: ManagementConfig) -> Self {
        Self { config }
    }

    /// Start serving `service`, with shutdown driven by OS signals.
    pub async fn start<T>(self, service: T) -> Result<RunningService, LifecycleError>
    where
        T: ManagementService,
    {
        self.start_with_signals(service, ShutdownSignals::install).await
    }

    /// Start serving `service`, with shutdown driven by the signal source
    /// that `signals` produces.
    ///
    /// `signals` is called after registration and before the serve loop is
    /// spawned.
    pub async fn start_with_signals<T, S>(
        self,
        service: T,
        signals: S,
    ) -> Result<RunningService, LifecycleError>
    where
        T: ManagementService,
        S: FnOnce() -> io::Result<ShutdownSignals>,
    {
        let listener = Listener::bind(&self.config.listener).await?;
        let local_addr = listener.local_addr();

        let mut server = ServerInstance::new(self.config.server.clone());
        server.register(service)?;
        let service_name = server.service_name().unwrap_or_default();
        let calls = server.calls();

        let signals = signals().map_err(LifecycleError::Signals)?;

        let shutdown = Shutdown::new();
        let stop = shutdown.requested();
        let (started_tx, started_rx) = oneshot::channel();
        let serve_task = tokio::spawn(async move {
            let _ = started_tx.send(());
            server.serve(listener, stop).await
        });

        started_rx
            .await
            .map_err(|_| ServeError::Aborted("serve task never started".to_string()))?;

        tracing::info!(
            address = %local_addr,
            service = service_name,
            grace_period_secs = self.config.shutdown.grace_period_secs,
            "Started server"
        );

        Ok(RunningService {
            local_addr,
            shutdown,
            signals,
            serve_task,
            calls,
            grace_period: self.config.shutdown.grace_period(),
        })
    }
}

/// A started server. Call [`RunningService::wait`] to block until it ends.
#[derive(Debug)]
pub struct RunningService {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    signals: ShutdownSignals,
    serve_task: JoinHandle<Result<(), ServeError>>,
    calls: CallTracker,
    grace_period: Duration,
}

impl RunningService {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn phase(&self) -> ShutdownPhase {
        self.shutdown.phase()
    }

    /// Block until the server has shut down or failed.
    ///
    /// Returns `Ok(())` only after a signal-initiated shutdown finished every
    /// in-flight call within the grace period. Connections that are open but
    /// idle do not hold shutdown up.
    pub async fn wait(mut self) -> Result<(), LifecycleError> {
        let result = self.run().await;
        self.shutdown.complete();
        result
    }

    async fn run(&mut self) -> Result<(), LifecycleError> {
        tokio::select! {
            joined = &mut self.serve_task => {
                let err = match flatten(joined) {
                    Ok(()) => ServeError::UnexpectedExit,
                    Err(e) => e,
                };
                return Err(err.into());
            }
            Some(signal) = self.signals.recv() => {
                tracing::info!(
                    %signal,
                    grace_period_secs = self.grace_period.as_secs(),
                    "Shutdown signal received, draining"
                );
            }
        }

        self.shutdown.begin();

        tokio::select! {
            drained = drain(&mut self.serve_task, &self.calls, self.grace_period) => drained,
            Some(signal) = self.signals.recv() => {
                self.serve_task.abort();
                tracing::warn!(%signal, "Second signal received, forcing shutdown");
                Err(LifecycleError::ForcedShutdown)
            }
        }
    }
}

/// Wait for the serve loop to stop after shutdown was requested.
///
/// Ends early once no call is in flight and the remaining connections had
/// `IDLE_CLOSE_WINDOW` to close; those are dropped with the serve task.
async fn drain(
    serve_task: &mut JoinHandle<Result<(), ServeError>>,
    calls: &CallTracker,
    grace_period: Duration,
) -> Result<(), LifecycleError> {
    let deadline = Instant::now() + grace_period;

    loop {
        tokio::select! {
            joined = &mut *serve_task => {
                return flatten(joined).map_err(LifecycleError::from);
            }
            idle = tokio::time::timeout_at(deadline, calls.wait_idle()) => {
                if idle.is_err() {
                    serve_task.abort();
                    tracing::warn!(
                        grace_period_secs = grace_period.as_secs(),
                        in_flight = calls.active_count(),
                        "Grace period elapsed, aborting in-flight calls"
                    );
                    return Err(LifecycleError::ShutdownTimeout(grace_period));
                }
            }
        }

        let settle = deadline.min(Instant::now() + IDLE_CLOSE_WINDOW);
        match tokio::time::timeout_at(settle, &mut *serve_task).await {
            Ok(joined) => return flatten(joined).map_err(LifecycleError::from),
            Err(_) if calls.active_count() == 0 => {
                serve_task.abort();
                tracing::info!("No calls in flight, closing idle connections");
                return Ok(());
            }
            // A call arrived while idle connections were closing.
            Err(_) => continue,
        }
    }
}

fn flatten(joined: Result<Result<(), ServeError>, JoinError>) -> Result<(), ServeError> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(ServeError::Aborted(e.to_string())),
    }
}
