//! Shared utilities for lifecycle and process tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};

use management_server::config::ManagementConfig;
use management_server::grpc::proto::management_service_client::ManagementServiceClient;
use management_server::grpc::proto::management_service_server::ManagementService;
use management_server::grpc::proto::{Empty, ServerKeyResponse};

/// Config bound to an ephemeral loopback port.
#[allow(dead_code)]
pub fn loopback_config(grace_period_secs: u64) -> ManagementConfig {
    let mut config = ManagementConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.shutdown.grace_period_secs = grace_period_secs;
    config
}

/// A port that was free a moment ago.
#[allow(dead_code)]
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Connect a gRPC client to a running server.
#[allow(dead_code)]
pub async fn connect(addr: SocketAddr) -> ManagementServiceClient<Channel> {
    ManagementServiceClient::connect(format!("http://{}", addr))
        .await
        .unwrap()
}

/// Management service whose health check takes `delay` to answer.
///
/// `started` is notified as soon as a health check is being handled.
#[derive(Clone)]
#[allow(dead_code)]
pub struct SlowService {
    pub delay: Duration,
    pub started: Arc<Notify>,
}

#[allow(dead_code)]
impl SlowService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: Arc::new(Notify::new()),
        }
    }
}

#[tonic::async_trait]
impl ManagementService for SlowService {
    async fn get_server_key(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<ServerKeyResponse>, Status> {
        Err(Status::unimplemented("slow service has no key"))
    }

    async fn is_healthy(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        Ok(Response::new(Empty {}))
    }
}
