//! End-to-end tests: LedClient → Unix socket → Server → RequestRouter →
//! FileStateStore on disk.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ledipc_core::{LedState, StateResponse};
use ledipc_manager::application::led_client::{LedClient, LedService};
use ledipc_manager::application::route_request::{RequestRouter, EMPTY_TARGET_MESSAGE};
use ledipc_manager::infrastructure::state_store::FileStateStore;
use ledipc_transport::{
    CancellationToken, ClientSession, ConnectionConfig, Endpoint, Server, ServerConfig, TransportError,
};
use tokio::task::JoinHandle;
use uuid::Uuid;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A manager on its own socket with its own state tree.
struct Manager {
    endpoint: Endpoint,
    root: PathBuf,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl Manager {
    async fn start() -> Self {
        let root = std::env::temp_dir().join(format!("ledipc-flow-{}", Uuid::new_v4()));
        let socket = std::env::temp_dir().join(format!("ledipc-flow-{}.sock", Uuid::new_v4()));
        let server = Server::bind(Endpoint::unix(socket), ServerConfig::default())
            .await
            .expect("bind must succeed");
        let endpoint = server.endpoint().clone();
        let router = Arc::new(RequestRouter::new(Arc::new(FileStateStore::new(&root))));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(server.serve(router, shutdown.clone()));
        Self {
            endpoint,
            root,
            shutdown,
            task,
        }
    }

    async fn client(&self) -> LedClient {
        LedClient::connect(self.endpoint.clone(), ConnectionConfig::client())
            .await
            .expect("manager must be reachable")
    }

    fn brightness(&self, target: &str) -> String {
        fs::read_to_string(self.root.join(format!("led_{target}")).join("brightness")).unwrap()
    }

    async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("manager must stop")
            .expect("manager task must not panic");
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn socket_path(endpoint: &Endpoint) -> &Path {
    endpoint.unix_path().expect("tests use unix endpoints")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_then_query_reflects_new_state() {
    // Arrange
    let manager = Manager::start().await;
    let mut client = manager.client().await;

    // Act
    let on = client.update("1", LedState::On).await.unwrap();
    let after_on = client.query("1").await.unwrap();
    let off = client.update("1", LedState::Off).await.unwrap();
    let after_off = client.query("1").await.unwrap();

    // Assert
    assert_eq!(on, StateResponse::success("1", LedState::On));
    assert_eq!(after_on, StateResponse::success("1", LedState::On));
    assert_eq!(off, StateResponse::success("1", LedState::Off));
    assert_eq!(after_off, StateResponse::success("1", LedState::Off));
    assert_eq!(manager.brightness("1"), "0\n");
    manager.stop().await;
}

#[tokio::test]
async fn test_query_unknown_led_reports_not_found() {
    let manager = Manager::start().await;
    let mut client = manager.client().await;

    let response = client.query("99").await.unwrap();

    assert_eq!(response, StateResponse::failure("99", "LED 99 not found"));
    manager.stop().await;
}

#[tokio::test]
async fn test_empty_led_name_gets_error_response_and_connection_survives() {
    // Arrange
    let manager = Manager::start().await;
    let mut client = manager.client().await;

    // Act
    let update = client.update("", LedState::On).await.unwrap();
    let query = client.query("").await.unwrap();
    let followup = client.update("2", LedState::On).await.unwrap();

    // Assert
    assert_eq!(update, StateResponse::failure("", EMPTY_TARGET_MESSAGE));
    assert_eq!(query, update);
    assert!(followup.is_success());
    manager.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients_on_distinct_leds() {
    // Arrange
    let manager = Manager::start().await;
    let mut tasks = Vec::new();

    // Act: each client owns one LED, even ones end up on, odd ones off
    for n in 0..8u32 {
        let mut client = manager.client().await;
        tasks.push(tokio::spawn(async move {
            let target = n.to_string();
            let state = if n % 2 == 0 { LedState::On } else { LedState::Off };
            for _ in 0..5 {
                let response = client.update(&target, state).await.unwrap();
                assert_eq!(response, StateResponse::success(target.as_str(), state));
            }
            client.query(&target).await.unwrap()
        }));
    }

    // Assert
    for (n, task) in tasks.into_iter().enumerate() {
        let expected = if n % 2 == 0 { LedState::On } else { LedState::Off };
        let response = task.await.unwrap();
        assert_eq!(response, StateResponse::success(n.to_string(), expected));
    }
    manager.stop().await;
}

#[tokio::test]
async fn test_concurrent_writers_on_same_led_leave_a_whole_value() {
    // Arrange
    let manager = Manager::start().await;
    let mut tasks = Vec::new();

    // Act
    for n in 0..8u32 {
        let mut client = manager.client().await;
        tasks.push(tokio::spawn(async move {
            let state = if n % 2 == 0 { LedState::On } else { LedState::Off };
            for _ in 0..10 {
                assert!(client.update("5", state).await.unwrap().is_success());
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Assert: one of the two values, never a mix or an empty file
    let stored = manager.brightness("5");
    assert!(stored == "1\n" || stored == "0\n", "unexpected content {stored:?}");
    let mut client = manager.client().await;
    assert!(client.query("5").await.unwrap().is_success());
    manager.stop().await;
}

#[tokio::test]
async fn test_malformed_request_times_out_client_and_server_keeps_serving() {
    // Arrange
    let manager = Manager::start().await;
    let short = ConnectionConfig::client().with_receive_timeout(Some(Duration::from_millis(200)));
    let mut raw = ClientSession::connect(&manager.endpoint, short).await.unwrap();

    // Act: a well-framed payload that is not a request
    let result = raw.call(&[0xFF, 0xFF, 0xFF]).await;

    // Assert
    assert!(matches!(result, Err(TransportError::Timeout(_))));
    assert!(!raw.is_open());
    let mut client = manager.client().await;
    assert!(client.update("1", LedState::On).await.unwrap().is_success());
    manager.stop().await;
}

#[tokio::test]
async fn test_state_survives_manager_restart() {
    // Arrange
    let first = Manager::start().await;
    let root = first.root.clone();
    first.client().await.update("8", LedState::On).await.unwrap();
    first.shutdown.cancel();
    first.task.await.unwrap();
    assert!(!socket_path(&first.endpoint).exists());

    // Act: a second manager over the same tree
    let socket = std::env::temp_dir().join(format!("ledipc-flow-{}.sock", Uuid::new_v4()));
    let server = Server::bind(Endpoint::unix(socket), ServerConfig::default()).await.unwrap();
    let endpoint = server.endpoint().clone();
    let shutdown = CancellationToken::new();
    let router = Arc::new(RequestRouter::new(Arc::new(FileStateStore::new(&root))));
    let task = tokio::spawn(server.serve(router, shutdown.clone()));
    let mut client = LedClient::connect(endpoint, ConnectionConfig::client()).await.unwrap();
    let response = client.query("8").await.unwrap();

    // Assert
    assert_eq!(response, StateResponse::success("8", LedState::On));
    shutdown.cancel();
    task.await.unwrap();
    let _ = fs::remove_dir_all(&root);
}
