//! End-to-end: real axum server on an ephemeral port, real websocket peers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chatline_core::protocol::{
    ChatMessage, Destination, LoginRequest, LoginResponse, Payload, RosterSnapshot,
};
use chatline_server::{app_state::AppState, config::ServerConfig, router};

const READ_TIMEOUT: Duration = Duration::from_secs(3);

async fn start_server() -> SocketAddr {
    let state = AppState::new(ServerConfig::default()).unwrap();
    let app = router::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    addr
}

struct Peer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Peer {
    async fn connect(addr: SocketAddr) -> Self {
        let (ws, _) = connect_async(format!("ws://{addr}/chat")).await.unwrap();
        Self { ws }
    }

    async fn send(&mut self, p: Payload) {
        self.ws.send(Message::Text(p.to_text().unwrap())).await.unwrap();
    }

    async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::Text(text.to_string())).await.unwrap();
    }

    async fn recv(&mut self) -> Payload {
        loop {
            let msg = timeout(READ_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("read failed");
            match msg {
                Message::Text(s) => return Payload::from_text(&s).unwrap(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    async fn login(&mut self, name: &str) -> LoginResponse {
        self.send(Payload::LoginRequest(LoginRequest { username: name.into() }))
            .await;
        match self.recv().await {
            Payload::LoginResponse(resp) => resp,
            other => panic!("expected login response, got {other:?}"),
        }
    }

    async fn roster(&mut self) -> Vec<String> {
        match self.recv().await {
            Payload::Roster(RosterSnapshot { members }) => members,
            other => panic!("expected roster, got {other:?}"),
        }
    }

    async fn chat(&mut self) -> ChatMessage {
        match self.recv().await {
            Payload::Chat(m) => m,
            other => panic!("expected chat, got {other:?}"),
        }
    }

    async fn say(&mut self, to: Destination, body: &str) {
        self.send(Payload::Chat(ChatMessage::outgoing(to, body))).await;
    }

    /// Wait for the server to end the stream (close frame, EOF, or reset).
    async fn assert_closed(&mut self) {
        timeout(READ_TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(s))) => panic!("unexpected frame before close: {s}"),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await
        .expect("connection was not closed");
    }

    async fn assert_silent(&mut self) {
        let quiet = timeout(Duration::from_millis(200), async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    other => return other,
                }
            }
        })
        .await;
        assert!(quiet.is_err(), "expected no frames, got {quiet:?}");
    }
}

#[tokio::test]
async fn alice_and_bob_scenario() {
    let addr = start_server().await;

    let mut alice = Peer::connect(addr).await;
    assert!(alice.login("alice").await.accepted);
    assert_eq!(alice.roster().await, vec!["alice"]);

    let mut bob = Peer::connect(addr).await;
    let rejected = bob.login("alice").await;
    assert!(!rejected.accepted);
    assert!(rejected.reason.contains("taken"), "reason: {}", rejected.reason);

    assert!(bob.login("bob").await.accepted);
    assert_eq!(bob.roster().await, vec!["alice", "bob"]);
    assert_eq!(alice.roster().await, vec!["alice", "bob"]);

    alice.say(Destination::All, "hi").await;
    for peer in [&mut alice, &mut bob] {
        let m = peer.chat().await;
        assert_eq!((m.sender.as_str(), m.body.as_str()), ("alice", "hi"));
        assert_eq!(m.destination, Destination::All);
    }

    bob.say(Destination::peer("alice"), "yo").await;
    for peer in [&mut alice, &mut bob] {
        let m = peer.chat().await;
        assert_eq!((m.sender.as_str(), m.body.as_str()), ("bob", "yo"));
        assert_eq!(m.destination, Destination::peer("alice"));
    }

    let mut carol = Peer::connect(addr).await;
    assert!(carol.login("carol").await.accepted);
    assert_eq!(carol.roster().await, vec!["alice", "bob", "carol"]);
    assert_eq!(alice.roster().await, vec!["alice", "bob", "carol"]);
    assert_eq!(bob.roster().await, vec!["alice", "bob", "carol"]);

    // Direct message between alice and bob never reaches carol.
    alice.say(Destination::peer("bob"), "psst").await;
    assert_eq!(bob.chat().await.body, "psst");
    assert_eq!(alice.chat().await.body, "psst");
    carol.assert_silent().await;

    // Leaving frees the name and updates the roster.
    drop(bob);
    assert_eq!(alice.roster().await, vec!["alice", "carol"]);
    assert_eq!(carol.roster().await, vec!["alice", "carol"]);

    let mut bob_again = Peer::connect(addr).await;
    assert!(bob_again.login("bob").await.accepted);
}

#[tokio::test]
async fn sender_cannot_be_spoofed() {
    let addr = start_server().await;
    let mut alice = Peer::connect(addr).await;
    assert!(alice.login("alice").await.accepted);
    alice.roster().await;

    alice
        .send(Payload::Chat(ChatMessage {
            sender: "mallory".into(),
            destination: Destination::All,
            body: "trust me".into(),
        }))
        .await;
    assert_eq!(alice.chat().await.sender, "alice");
}

#[tokio::test]
async fn non_login_frames_are_rejected_before_login() {
    let addr = start_server().await;
    let mut peer = Peer::connect(addr).await;

    peer.say(Destination::All, "too early").await;
    let resp = match peer.recv().await {
        Payload::LoginResponse(r) => r,
        other => panic!("expected login response, got {other:?}"),
    };
    assert!(!resp.accepted);
    assert!(resp.reason.contains("expected login"));

    peer.send_raw("not json at all").await;
    assert!(matches!(peer.recv().await, Payload::LoginResponse(r) if !r.accepted));

    let invalid = peer.login("ALL").await;
    assert!(!invalid.accepted);

    // Still authenticating: a valid login goes through.
    assert!(peer.login("dave").await.accepted);
    assert_eq!(peer.roster().await, vec!["dave"]);
}

#[tokio::test]
async fn unknown_kind_is_dropped_while_active() {
    let addr = start_server().await;
    let mut alice = Peer::connect(addr).await;
    assert!(alice.login("alice").await.accepted);
    alice.roster().await;

    alice.send_raw(r#"{"type":"typing","data":{}}"#).await;
    alice.say(Destination::All, "still connected").await;
    assert_eq!(alice.chat().await.body, "still connected");
}

#[tokio::test]
async fn concurrent_logins_with_same_name_have_one_winner() {
    let addr = start_server().await;
    let mut a = Peer::connect(addr).await;
    let mut b = Peer::connect(addr).await;

    let (ra, rb) = tokio::join!(a.login("zoe"), b.login("zoe"));
    assert!(ra.accepted ^ rb.accepted, "a={ra:?} b={rb:?}");
    let loser = if ra.accepted { rb } else { ra };
    assert!(loser.reason.contains("taken"));
}

async fn alice_and_bob_online(addr: SocketAddr) -> (Peer, Peer) {
    let mut alice = Peer::connect(addr).await;
    assert!(alice.login("alice").await.accepted);
    assert_eq!(alice.roster().await, vec!["alice"]);

    let mut bob = Peer::connect(addr).await;
    assert!(bob.login("bob").await.accepted);
    assert_eq!(bob.roster().await, vec!["alice", "bob"]);
    assert_eq!(alice.roster().await, vec!["alice", "bob"]);
    (alice, bob)
}

#[tokio::test]
async fn malformed_chat_body_closes_the_connection() {
    let addr = start_server().await;
    let (mut alice, mut bob) = alice_and_bob_online(addr).await;

    alice
        .send_raw(r#"{"type":"chat_message","data":{"message":"x"}}"#)
        .await;
    alice.assert_closed().await;
    assert_eq!(bob.roster().await, vec!["bob"]);

    // The name is free again.
    let mut again = Peer::connect(addr).await;
    assert!(again.login("alice").await.accepted);
}

#[tokio::test]
async fn non_json_frame_closes_the_connection() {
    let addr = start_server().await;
    let (mut alice, mut bob) = alice_and_bob_online(addr).await;

    alice.send_raw("not json").await;
    alice.assert_closed().await;
    assert_eq!(bob.roster().await, vec!["bob"]);
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let addr = start_server().await;
    let mut alice = Peer::connect(addr).await;
    alice.ws.send(Message::Ping(vec![7, 7])).await.unwrap();

    let pong = timeout(READ_TIMEOUT, async {
        loop {
            match alice.ws.next().await {
                Some(Ok(Message::Pong(payload))) => return payload,
                Some(Ok(_)) => continue,
                other => panic!("stream ended before pong: {other:?}"),
            }
        }
    })
    .await
    .expect("no pong");
    assert_eq!(pong, vec![7, 7]);

    // Still usable afterwards.
    assert!(alice.login("alice").await.accepted);
}
