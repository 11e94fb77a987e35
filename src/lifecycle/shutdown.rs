//! Shutdown coordination for the management server.

use tokio::sync::watch;

/// Where the process is in its shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Serving; no shutdown requested yet.
    Armed,
    /// Shutdown requested, draining in-flight calls.
    ShuttingDown,
    /// Cleanup finished (or was abandoned); the process is about to exit.
    Terminated,
}

/// Coordinator for graceful shutdown.
///
/// Holds the current [`ShutdownPhase`] in a watch channel that long-running
/// tasks can subscribe to. Transitions only move forward.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<ShutdownPhase>,
}

impl Shutdown {
    /// Create a new coordinator in the `Armed` phase.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ShutdownPhase::Armed);
        Self { tx }
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownPhase> {
        self.tx.subscribe()
    }

    /// Current phase.
    pub fn phase(&self) -> ShutdownPhase {
        *self.tx.borrow()
    }

    /// Request shutdown.
    ///
    /// Returns `true` only for the call that moved `Armed → ShuttingDown`;
    /// every later call is a no-op.
    pub fn begin(&self) -> bool {
        self.tx.send_if_modified(|phase| {
            if *phase == ShutdownPhase::Armed {
                *phase = ShutdownPhase::ShuttingDown;
                true
            } else {
                false
            }
        })
    }

    /// Mark shutdown as finished.
    pub fn complete(&self) {
        self.tx.send_if_modified(|phase| {
            if *phase == ShutdownPhase::Terminated {
                false
            } else {
                *phase = ShutdownPhase::Terminated;
                true
            }
        });
    }

    /// Future that resolves once shutdown has been requested.
    ///
    /// Owns its receiver, so it can be handed to a spawned task. Also
    /// resolves if the coordinator is dropped.
    pub fn requested(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            let _ = rx.wait_for(|phase| *phase != ShutdownPhase::Armed).await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
