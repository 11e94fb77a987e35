//! Startup and shutdown behaviour of the bootstrap, driven in-process.

use std::time::{Duration, Instant};

use tonic::Code;

use management_server::grpc::proto::Empty;
use management_server::grpc::ManagementServer;
use management_server::lifecycle::{Bootstrap, LifecycleError, ShutdownSignals, Signal};

mod common;

#[tokio::test]
async fn test_idle_shutdown_is_clean_and_releases_port() {
    let (tx, signals) = ShutdownSignals::pair();
    let running = Bootstrap::new(common::loopback_config(5))
        .start_with_signals(ManagementServer::new(), move || Ok(signals))
        .await
        .unwrap();
    let addr = running.local_addr();

    let mut client = common::connect(addr).await;
    client.is_healthy(Empty {}).await.unwrap();
    let key = client
        .get_server_key(Empty {})
        .await
        .unwrap()
        .into_inner();
    assert_eq!(key.key.len(), 32);

    tx.send(Signal::Interrupt).await.unwrap();
    tokio::time::timeout(Duration::from_secs(6), running.wait())
        .await
        .expect("shutdown exceeded grace period")
        .unwrap();

    tokio::net::TcpListener::bind(addr).await.unwrap();
}

#[tokio::test]
async fn test_in_flight_call_finishes_within_grace() {
    let service = common::SlowService::new(Duration::from_millis(500));
    let started = service.started.clone();

    let (tx, signals) = ShutdownSignals::pair();
    let running = Bootstrap::new(common::loopback_config(5))
        .start_with_signals(service, move || Ok(signals))
        .await
        .unwrap();

    let mut client = common::connect(running.local_addr()).await;
    let call = tokio::spawn(async move {
        client
            .is_healthy(Empty {})
            .await
    });
    started.notified().await;

    tx.send(Signal::Terminate).await.unwrap();
    tokio::time::timeout(Duration::from_secs(6), running.wait())
        .await
        .expect("shutdown exceeded grace period")
        .unwrap();

    assert!(call.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_stuck_call_hits_grace_period() {
    let service = common::SlowService::new(Duration::from_secs(60));
    let started = service.started.clone();

    let (tx, signals) = ShutdownSignals::pair();
    let running = Bootstrap::new(common::loopback_config(1))
        .start_with_signals(service, move || Ok(signals))
        .await
        .unwrap();

    let mut client = common::connect(running.local_addr()).await;
    tokio::spawn(async move {
        let _ = client
            .is_healthy(Empty {})
            .await;
    });
    started.notified().await;

    tx.send(Signal::Terminate).await.unwrap();
    let err = tokio::time::timeout(Duration::from_secs(5), running.wait())
        .await
        .expect("shutdown hung past the grace period")
        .unwrap_err();

    assert!(matches!(err, LifecycleError::ShutdownTimeout(d) if d == Duration::from_secs(1)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_second_signal_forces_shutdown() {
    let service = common::SlowService::new(Duration::from_secs(60));
    let started = service.started.clone();

    let (tx, signals) = ShutdownSignals::pair();
    let running = Bootstrap::new(common::loopback_config(30))
        .start_with_signals(service, move || Ok(signals))
        .await
        .unwrap();

    let mut client = common::connect(running.local_addr()).await;
    tokio::spawn(async move {
        let _ = client
            .is_healthy(Empty {})
            .await;
    });
    started.notified().await;

    let waiter = tokio::spawn(running.wait());
    tx.send(Signal::Interrupt).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());

    tx.send(Signal::Interrupt).await.unwrap();
    let err = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("forced shutdown did not happen")
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, LifecycleError::ForcedShutdown));
    assert_eq!(err.exit_code(), 130);
}

#[tokio::test]
async fn test_second_bootstrap_on_same_port_fails() {
    let (_tx, signals) = ShutdownSignals::pair();
    let first = Bootstrap::new(common::loopback_config(5))
        .start_with_signals(ManagementServer::new(), move || Ok(signals))
        .await
        .unwrap();

    let mut config = common::loopback_config(5);
    config.listener.port = first.local_addr().port() as i64;

    let (_tx2, signals2) = ShutdownSignals::pair();
    let err = Bootstrap::new(config)
        .start_with_signals(ManagementServer::new(), move || Ok(signals2))
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Bind(_)));
}

#[tokio::test]
async fn test_silent_connection_does_not_block_shutdown() {
    let (tx, signals) = ShutdownSignals::pair();
    let running = Bootstrap::new(common::loopback_config(3))
        .start_with_signals(ManagementServer::new(), move || Ok(signals))
        .await
        .unwrap();

    // Connected, but never speaks HTTP/2.
    let _silent = tokio::net::TcpStream::connect(running.local_addr())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    tx.send(Signal::Interrupt).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), running.wait())
        .await
        .expect("shutdown hung")
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_request_timeout_cancels_slow_call() {
    let mut config = common::loopback_config(5);
    config.server.request_timeout_secs = Some(1);

    let (tx, signals) = ShutdownSignals::pair();
    let running = Bootstrap::new(config)
        .start_with_signals(
            common::SlowService::new(Duration::from_secs(5)),
            move || Ok(signals),
        )
        .await
        .unwrap();

    let mut client = common::connect(running.local_addr()).await;
    let started = Instant::now();
    let status = client.is_healthy(Empty {}).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(
        matches!(status.code(), Code::Cancelled | Code::DeadlineExceeded),
        "unexpected status: {:?}",
        status
    );

    tx.send(Signal::Terminate).await.unwrap();
    tokio::time::timeout(Duration::from_secs(6), running.wait())
        .await
        .expect("shutdown exceeded grace period")
        .unwrap();
}

#[tokio::test]
async fn test_concurrency_limit_serializes_calls() {
    let mut config = common::loopback_config(5);
    config.server.concurrency_limit_per_connection = Some(1);

    let (_tx, signals) = ShutdownSignals::pair();
    let running = Bootstrap::new(config)
        .start_with_signals(
            common::SlowService::new(Duration::from_millis(400)),
            move || Ok(signals),
        )
        .await
        .unwrap();

    let client = common::connect(running.local_addr()).await;
    let mut first = client.clone();
    let mut second = client;

    let started = Instant::now();
    let (a, b) = tokio::join!(first.is_healthy(Empty {}), second.is_healthy(Empty {}));
    a.unwrap();
    b.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(780));
}
