//! Default `ManagementService` implementation.
//!
//! Peer registry, key exchange and topology live outside this crate; this
//! server only hands out its public key and answers health checks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::RngCore;
use tonic::{Request, Response, Status};

use crate::grpc::proto::management_service_server::ManagementService;
use crate::grpc::proto::{Empty, ServerKeyResponse};

const KEY_LEN: usize = 32;

/// How long clients may cache the server key.
const KEY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Management service backed by a per-process key.
#[derive(Debug, Clone)]
pub struct ManagementServer {
    key: [u8; KEY_LEN],
    key_ttl: Duration,
}

impl ManagementServer {
    /// Create a server with a freshly generated key.
    pub fn new() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key, key_ttl: KEY_TTL }
    }

    pub fn public_key(&self) -> &[u8] {
        &self.key
    }
}

impl Default for ManagementServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tonic::async_trait]
impl ManagementService for ManagementServer {
    async fn get_server_key(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<ServerKeyResponse>, Status> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Status::internal(e.to_string()))?;
        let expires_at = i64::try_from((now + self.key_ttl).as_secs())
            .map_err(|e| Status::internal(e.to_string()))?;

        tracing::debug!(expires_at, "Serving server key");

        Ok(Response::new(ServerKeyResponse {
            key: self.key.to_vec(),
            expires_at,
        }))
    }

    async fn is_healthy(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        Ok(Response::new(Empty {}))
    }
}
