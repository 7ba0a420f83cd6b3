//! Real sockets against the full router: connect, talk, disconnect.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use starforge_server::api::{configure, AppState};
use starforge_server::auth::StoreTokenVerifier;
use starforge_server::config::HubConfig;
use starforge_server::hub::{self, HubHandle};
use starforge_server::ledger::CreditLedger;
use starforge_server::protocol::ServerMessage;
use starforge_server::simulation::TickRunner;
use starforge_server::store::{MemoryStore, RecordStore, TableExt};
use starforge_server::tables::User;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// Serve the app on an ephemeral port. Returns the hub and the ws url.
async fn serve(hub_config: HubConfig) -> (HubHandle, String) {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    store
        .create(User {
            id: 0,
            name: "ada".to_string(),
            credits: 0,
            auth_token: "ada-token".to_string(),
        })
        .unwrap();

    let (hub, _) = hub::spawn(&hub_config);
    let ledger = Arc::new(CreditLedger::new(store.clone()));
    let app = configure(AppState {
        hub: hub.clone(),
        ticks: Arc::new(TickRunner::new(store.clone(), ledger, hub.clone())),
        verifier: Arc::new(StoreTokenVerifier::new(store)),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (hub, format!("ws://{addr}/ws"))
}

async fn wait_for_connections(hub: &HubHandle, expected: usize) {
    timeout(WAIT, async {
        while hub.stats().await.unwrap().connections != expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("hub never reached {expected} connections"));
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = timeout(WAIT, client.next())
            .await
            .expect("no frame in time")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_client_close_unregisters_connection() {
    let (hub, url) = serve(HubConfig::default()).await;
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_connections(&hub, 1).await;

    client
        .send(Message::Text(
            json!({"type": "auth", "payload": "ada-token"}).to_string().into(),
        ))
        .await
        .unwrap();
    assert_eq!(
        next_json(&mut client).await,
        json!({"type": "auth_success", "payload": {"userId": 1}})
    );

    hub.broadcast(&ServerMessage::Tick { tick: 3 }).await.unwrap();
    assert_eq!(
        next_json(&mut client).await,
        json!({"type": "tick", "payload": {"tick": 3}})
    );

    client.close(None).await.unwrap();
    wait_for_connections(&hub, 0).await;
    assert_eq!(hub.stats().await.unwrap().authenticated, 0);
}

#[tokio::test]
async fn test_dropped_client_unregisters_connection() {
    let (hub, url) = serve(HubConfig::default()).await;
    let (client, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_connections(&hub, 1).await;

    drop(client);
    wait_for_connections(&hub, 0).await;
}

#[tokio::test]
async fn test_overflowed_client_stream_ends() {
    let (hub, url) = serve(HubConfig {
        connection_queue: 1,
        command_queue: 64,
    })
    .await;
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_connections(&hub, 1).await;

    // Bursts queue faster than the socket writer drains, so the client is
    // evicted on one of them.
    timeout(WAIT, async {
        let mut tick = 0;
        while hub.stats().await.unwrap().connections > 0 {
            for _ in 0..32 {
                tick += 1;
                hub.broadcast(&ServerMessage::Tick { tick }).await.unwrap();
            }
        }
    })
    .await
    .expect("client was never evicted");

    // Whatever was already written may still arrive, then the server closes.
    timeout(WAIT, async {
        while let Some(received) = client.next().await {
            match received {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await
    .expect("client stream did not end after eviction");
}
