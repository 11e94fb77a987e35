//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT, SIGTERM; Ctrl-C on Windows)
//! - Translate signals into [`Signal`] values on a channel
//!
//! # Design Decisions
//! - Handlers are registered eagerly in [`ShutdownSignals::install`], so a
//!   signal that arrives before anyone waits is queued, not lost
//! - The first signal starts graceful shutdown, a second one forces it

use std::io;

use tokio::sync::mpsc;

/// A shutdown-relevant signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Interrupt => write!(f, "SIGINT"),
            Signal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Stream of shutdown signals.
#[derive(Debug)]
pub struct ShutdownSignals {
    rx: mpsc::Receiver<Signal>,
}

impl ShutdownSignals {
    /// Register OS signal handlers and start forwarding.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(4);
        forward_os_signals(tx)?;
        tracing::debug!("Signal handlers installed");
        Ok(Self { rx })
    }

    /// A signal source fed by hand instead of by the OS.
    ///
    /// Used when the embedding process owns signal handling, and in tests.
    pub fn pair() -> (mpsc::Sender<Signal>, Self) {
        let (tx, rx) = mpsc::channel(4);
        (tx, Self { rx })
    }

    /// Wait for the next signal. `None` once no more signals can arrive.
    pub async fn recv(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }
}

#[cfg(unix)]
fn forward_os_signals(tx: mpsc::Sender<Signal>) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                r = interrupt.recv() => r.map(|_| Signal::Interrupt),
                r = terminate.recv() => r.map(|_| Signal::Terminate),
            };
            let Some(sig) = received else { break };
            if tx.send(sig).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}

#[cfg(windows)]
fn forward_os_signals(tx: mpsc::Sender<Signal>) -> io::Result<()> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    tokio::spawn(async move {
        while ctrl_c.recv().await.is_some() {
            if tx.send(Signal::Interrupt).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}
