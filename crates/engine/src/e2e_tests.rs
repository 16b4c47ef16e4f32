//! End-to-end tests over a real WebSocket
//!
//! Each test boots the full engine (router, dispatcher, SQLite gateway on an
//! in-memory database) on an ephemeral port and drives it with
//! tokio-tungstenite clients, asserting on the JSON the wire actually
//! carries.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use plaza_domain::UserId;

use crate::persistence::SqliteGateway;
use crate::state::AppState;
use crate::websocket;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

async fn spawn_engine() -> (String, Arc<SqliteGateway>) {
    let gateway = Arc::new(
        SqliteGateway::connect("sqlite::memory:")
            .await
            .expect("in-memory database"),
    );
    let state = Arc::new(AppState::new(gateway.clone(), Duration::from_secs(5)));
    let app = websocket::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    (format!("ws://{addr}/ws"), gateway)
}

struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("connect");
        Self { stream }
    }

    async fn send(&mut self, text: impl Into<String>) {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .expect("send");
    }

    async fn recv(&mut self) -> Value {
        loop {
            let frame = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("receive timed out")
                .expect("stream ended")
                .expect("frame");
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).expect("valid JSON frame");
            }
        }
    }

    /// Receive until a frame of the given type arrives, skipping interleaved
    /// broadcasts from other connections.
    async fn recv_type(&mut self, message_type: &str) -> Value {
        loop {
            let frame = self.recv().await;
            if frame["type"] == message_type {
                return frame;
            }
        }
    }

    /// Register, authenticate, and return the session payload.
    async fn sign_in(&mut self, username: &str, password: &str) -> Value {
        self.send(format!("/register {username} {username}@example.com {password}"))
            .await;
        self.recv_type("REGISTERED").await;
        self.authenticate(username, password).await
    }

    async fn authenticate(&mut self, username: &str, password: &str) -> Value {
        self.send(format!("/login {username} {password}")).await;
        self.recv_type("AUTHENTICATED").await
    }

    async fn expect_closed(mut self) {
        loop {
            match timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("close timed out")
            {
                Some(Ok(Message::Close(_))) | None => return,
                Some(Ok(_)) => continue,
                Some(Err(_)) => return,
            }
        }
    }
}

#[tokio::test]
async fn register_login_join_and_chat() {
    let (url, _gateway) = spawn_engine().await;

    let mut alice = TestClient::connect(&url).await;
    let session = alice.sign_in("alice", "pw-alice").await;
    assert_eq!(session["data"]["username"], "alice");
    assert!(session["data"]["userId"].as_i64().unwrap() > 0);

    alice
        .send(json!({"type": "CREATE_ROOM", "reqId": "c1", "name": "Lobby"}).to_string())
        .await;
    let created = alice.recv_type("ROOM_CREATED").await;
    assert_eq!(created["reqId"], "c1");

    alice.send("/join Lobby").await;
    let joined = alice.recv_type("ROOM_JOINED").await;
    assert_eq!(joined["room"], "Lobby");
    assert_eq!(joined["data"], json!([]));

    let mut bob = TestClient::connect(&url).await;
    bob.sign_in("bob", "pw-bob").await;
    bob.send("/join Lobby").await;
    bob.recv_type("ROOM_JOINED").await;

    // Alice sees bob arrive, bob's chat line, and her own line never echoes
    let arrival = alice.recv_type("USER_JOINED").await;
    assert_eq!(arrival["username"], "bob");

    bob.send("hello from bob").await;
    let line = alice.recv_type("CHAT").await;
    assert_eq!(line["from"], "bob");
    assert_eq!(line["text"], "hello from bob");

    alice.send("hi bob").await;
    let line = bob.recv_type("CHAT").await;
    assert_eq!(line["from"], "alice");
    assert_eq!(line["text"], "hi bob");
}

#[tokio::test]
async fn furniture_flows_reach_everyone_and_survive_resubscribe() {
    let (url, _gateway) = spawn_engine().await;

    let mut alice = TestClient::connect(&url).await;
    alice.sign_in("alice", "pw").await;
    alice
        .send(json!({"type": "CREATE_ROOM", "name": "Studio"}).to_string())
        .await;
    alice.recv_type("ROOM_CREATED").await;
    alice
        .send(json!({"type": "SUBSCRIBE_ROOM", "reqId": "s1", "room": "Studio"}).to_string())
        .await;
    let state = alice.recv_type("ROOM_STATE").await;
    assert_eq!(state["reqId"], "s1");
    assert_eq!(state["furniture"], json!([]));

    let mut bob = TestClient::connect(&url).await;
    bob.sign_in("bob", "pw").await;
    bob.send(json!({"type": "SUBSCRIBE_ROOM", "room": "Studio"}).to_string())
        .await;
    bob.recv_type("ROOM_STATE").await;

    // Placement echoes to the placer and the bystander alike
    alice
        .send(
            json!({
                "type": "CREATE_FURNITURE",
                "room": "Studio",
                "uid": "sofa-1",
                "proto_id": "sofa",
                "tx": 2.0,
                "ty": 3.0,
                "color": "#aabbcc",
            })
            .to_string(),
        )
        .await;
    let placed = alice.recv_type("FURNITURE_UPDATED").await;
    assert_eq!(placed["furniture"]["uid"], "sofa-1");
    assert_eq!(placed["furniture"]["sprite_path"], "assets/furniture/sofa.png");
    let seen = bob.recv_type("FURNITURE_UPDATED").await;
    assert_eq!(seen["furniture"]["color"], "#aabbcc");

    bob.send(
        json!({
            "type": "UPDATE_FURNITURE",
            "room": "Studio",
            "uid": "sofa-1",
            "tx": 7.0,
            "ty": 8.0,
        })
        .to_string(),
    )
    .await;
    let moved = alice.recv_type("FURNITURE_UPDATED").await;
    assert_eq!(moved["furniture"]["tx"], 7.0);
    assert_eq!(moved["furniture"]["ty"], 8.0);

    // A fresh subscriber gets the durable state, not an empty room
    let mut carol = TestClient::connect(&url).await;
    carol.sign_in("carol", "pw").await;
    carol
        .send(json!({"type": "SUBSCRIBE_ROOM", "room": "Studio"}).to_string())
        .await;
    let state = carol.recv_type("ROOM_STATE").await;
    assert_eq!(state["furniture"][0]["uid"], "sofa-1");
    assert_eq!(state["furniture"][0]["tx"], 7.0);
}

#[tokio::test]
async fn pin_protected_rooms_reject_bad_pins() {
    let (url, _gateway) = spawn_engine().await;

    let mut owner = TestClient::connect(&url).await;
    owner.sign_in("owner", "pw").await;
    owner
        .send(json!({"type": "CREATE_ROOM", "name": "Vault", "pin": "4321"}).to_string())
        .await;
    owner.recv_type("ROOM_CREATED").await;

    let mut guest = TestClient::connect(&url).await;
    guest.sign_in("guest", "pw").await;

    // Pinned rooms are invisible to pinless joins
    guest.send("/join Vault").await;
    let err = guest.recv_type("ERROR").await;
    assert_eq!(err["error"]["code"], "ROOM_NOT_FOUND");

    // Pinned rooms only unlock for their owner, even with the right pin
    guest.send("/join Vault 4321").await;
    let err = guest.recv_type("ERROR").await;
    assert_eq!(err["error"]["code"], "ROOM_NOT_FOUND");

    // The owner with the wrong pin fails identically
    owner.send("/join Vault 0000").await;
    let err = owner.recv_type("ERROR").await;
    assert_eq!(err["error"]["code"], "ROOM_NOT_FOUND");

    owner.send("/join Vault 4321").await;
    let joined = owner.recv_type("ROOM_JOINED").await;
    assert_eq!(joined["room"], "Vault");

    // The directory lists the room but never its pin
    guest
        .send(json!({"type": "GET_ROOMS", "reqId": "r1"}).to_string())
        .await;
    let rooms = guest.recv_type("ROOMS").await;
    let vault = rooms["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|room| room["name"] == "Vault")
        .unwrap();
    assert_eq!(vault["is_public"], false);
    assert!(vault.get("pin").is_none());
    assert_eq!(vault["player_count"], 1);
}

#[tokio::test]
async fn kicked_connection_is_notified_and_closed() {
    let (url, gateway) = spawn_engine().await;

    let mut admin = TestClient::connect(&url).await;
    let session = admin.sign_in("admin", "pw").await;
    let admin_id = UserId::new(session["data"]["userId"].as_i64().unwrap());
    gateway.grant_role(admin_id, "admin").await.unwrap();
    // Roles load at authenticate time
    let session = admin.authenticate("admin", "pw").await;
    assert_eq!(session["data"]["roles"], json!(["admin", "user"]));

    admin
        .send(json!({"type": "CREATE_ROOM", "name": "Lobby"}).to_string())
        .await;
    admin.recv_type("ROOM_CREATED").await;
    admin.send("/join Lobby").await;
    admin.recv_type("ROOM_JOINED").await;

    let mut troll = TestClient::connect(&url).await;
    troll.sign_in("troll", "pw").await;
    troll.send("/join Lobby").await;
    troll.recv_type("ROOM_JOINED").await;

    admin.send("/kick troll").await;

    let notice = troll.recv_type("KICKED").await;
    assert_eq!(notice["reason"], "kicked by an administrator");
    troll.expect_closed().await;

    // The room hears the departure
    let gone = admin.recv_type("USER_DISCONNECTED").await;
    assert_eq!(gone["username"], "troll");
    assert_eq!(gone["room"], "Lobby");
}

#[tokio::test]
async fn template_directory_is_served() {
    let (url, _gateway) = spawn_engine().await;
    let mut client = TestClient::connect(&url).await;

    client
        .send(json!({"type": "GET_ROOM_TEMPLATES", "reqId": "t1"}).to_string())
        .await;
    let templates = client.recv_type("ROOM_TEMPLATES").await;
    assert_eq!(templates["reqId"], "t1");
    let first = &templates["data"][0];
    let template_id = first["id"].as_i64().unwrap();

    client
        .send(json!({"type": "GET_ROOM_TEMPLATE", "reqId": "t2", "templateId": template_id}).to_string())
        .await;
    let template = client.recv_type("ROOM_TEMPLATE").await;
    assert_eq!(template["data"]["id"], template_id);
    assert_eq!(template["data"]["name"], first["name"]);

    client
        .send(json!({"type": "GET_ROOM_TEMPLATE", "templateId": 99999}).to_string())
        .await;
    let err = client.recv_type("ERROR").await;
    assert_eq!(err["error"]["code"], "NOT_FOUND");
}
