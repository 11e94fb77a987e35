//! In-flight call tracking for graceful shutdown.
//!
//! # Responsibilities
//! - Count RPCs currently inside the registered service
//! - Let shutdown wait until that count reaches zero
//!
//! Open connections with no call in flight are not counted; shutdown does
//! not wait for them.

use std::sync::Arc;

use tokio::sync::watch;
use tonic::{Request, Response, Status};

use crate::grpc::proto::management_service_server::ManagementService;
use crate::grpc::proto::{Empty, ServerKeyResponse};

/// Shared counter of in-flight calls.
#[derive(Debug, Clone)]
pub struct CallTracker {
    active: Arc<watch::Sender<usize>>,
}

impl CallTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            active: Arc::new(tx),
        }
    }

    /// Record a call. The returned guard ends it on drop.
    pub fn track(&self) -> CallGuard {
        self.active.send_modify(|n| *n += 1);
        CallGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Number of calls in flight right now.
    pub fn active_count(&self) -> usize {
        *self.active.borrow()
    }

    /// Resolve once no call is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.active.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for CallTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for one in-flight call.
#[derive(Debug)]
pub struct CallGuard {
    active: Arc<watch::Sender<usize>>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.active.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Wraps a service so every call is counted by a [`CallTracker`].
pub(crate) struct TrackedService<T> {
    inner: T,
    calls: CallTracker,
}

impl<T> TrackedService<T> {
    pub(crate) fn new(inner: T, calls: CallTracker) -> Self {
        Self { inner, calls }
    }
}

#[tonic::async_trait]
impl<T: ManagementService> ManagementService for TrackedService<T> {
    async fn get_server_key(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ServerKeyResponse>, Status> {
        let _call = self.calls.track();
        self.inner.get_server_key(request).await
    }

    async fn is_healthy(&self, request: Request<Empty>) -> Result<Response<Empty>, Status> {
        let _call = self.calls.track();
        self.inner.is_healthy(request).await
    }
}
