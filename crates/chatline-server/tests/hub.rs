//! Session hub properties, exercised through `HubHandle` with plain channels.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::time::timeout;

use chatline_core::protocol::{ChatMessage, Destination, Payload};
use chatline_core::ChatError;
use chatline_server::config::HubSection;
use chatline_server::hub::{Connection, HubHandle, Session};

fn hub() -> HubHandle {
    HubHandle::spawn(&HubSection::default())
}

fn session(hub: &HubHandle, name: &str) -> (Session, mpsc::Receiver<Message>) {
    session_with_capacity(hub, name, 64)
}

fn session_with_capacity(
    hub: &HubHandle,
    name: &str,
    cap: usize,
) -> (Session, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(cap);
    (hub.new_session(name, Connection::new(tx)), rx)
}

async fn join(hub: &HubHandle, name: &str) -> (u64, mpsc::Receiver<Message>) {
    let (s, mut rx) = session(hub, name);
    let id = s.id;
    hub.register(s).await.unwrap();
    // accepted login response + first roster
    drain(&mut rx);
    (id, rx)
}

fn payload(msg: Message) -> Payload {
    match msg {
        Message::Text(s) => Payload::from_text(&s).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    }
}

async fn next(rx: &mut mpsc::Receiver<Message>) -> Payload {
    let msg = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    payload(msg)
}

fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<Payload> {
    let mut out = Vec::new();
    while let Ok(m) = rx.try_recv() {
        out.push(payload(m));
    }
    out
}

fn chat(sender: &str, to: Destination, body: &str) -> ChatMessage {
    ChatMessage {
        sender: sender.into(),
        destination: to,
        body: body.into(),
    }
}

#[tokio::test]
async fn name_is_taken_from_register_until_unregister() {
    let hub = hub();
    assert!(!hub.is_name_taken("alice").await.unwrap());

    let (id, _rx) = join(&hub, "alice").await;
    assert!(hub.is_name_taken("alice").await.unwrap());

    // Visible from another handle as well.
    let other = hub.clone();
    assert!(other.is_name_taken("alice").await.unwrap());

    assert!(hub.unregister(id).await.unwrap());
    assert!(!hub.is_name_taken("alice").await.unwrap());
}

#[tokio::test]
async fn newcomer_sees_accept_then_roster_containing_itself() {
    let hub = hub();
    let (_alice_id, mut alice_rx) = join(&hub, "alice").await;

    let (bob, mut bob_rx) = session(&hub, "bob");
    hub.register(bob).await.unwrap();

    match next(&mut bob_rx).await {
        Payload::LoginResponse(resp) => assert!(resp.accepted),
        other => panic!("expected login response, got {other:?}"),
    }
    match next(&mut bob_rx).await {
        Payload::Roster(snap) => assert_eq!(snap.members, vec!["alice", "bob"]),
        other => panic!("expected roster, got {other:?}"),
    }
    match next(&mut alice_rx).await {
        Payload::Roster(snap) => assert_eq!(snap.members, vec!["alice", "bob"]),
        other => panic!("expected roster, got {other:?}"),
    }
    assert_eq!(hub.roster().await.unwrap(), vec!["alice", "bob"]);
}

#[tokio::test]
async fn duplicate_register_is_refused_without_side_effects() {
    let hub = hub();
    let (_id, mut alice_rx) = join(&hub, "alice").await;

    let (dup, mut dup_rx) = session(&hub, "alice");
    let err = hub.register(dup).await.unwrap_err();
    assert!(matches!(err, ChatError::NameTaken));

    assert!(drain(&mut dup_rx).is_empty());
    assert!(drain(&mut alice_rx).is_empty());
    assert_eq!(hub.roster().await.unwrap(), vec!["alice"]);
}

#[tokio::test]
async fn concurrent_registrations_for_one_name_have_one_winner() {
    let hub = hub();
    let mut tasks = Vec::new();
    let mut receivers = Vec::new();
    for _ in 0..16 {
        let (s, rx) = session(&hub, "alice");
        receivers.push(rx);
        let hub = hub.clone();
        tasks.push(tokio::spawn(async move { hub.register(s).await }));
    }

    let mut wins = 0;
    for t in tasks {
        match t.await.unwrap() {
            Ok(()) => wins += 1,
            Err(ChatError::NameTaken) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(hub.roster().await.unwrap(), vec!["alice"]);
}

#[tokio::test]
async fn broadcast_reaches_everyone_including_sender() {
    let hub = hub();
    let (_a, mut a) = join(&hub, "alice").await;
    let (_b, mut b) = join(&hub, "bob").await;
    let (_c, mut c) = join(&hub, "carol").await;
    drain(&mut a);
    drain(&mut b);

    let delivered = hub.route(chat("alice", Destination::All, "hi")).await.unwrap();
    assert_eq!(delivered, 3);

    for rx in [&mut a, &mut b, &mut c] {
        match next(rx).await {
            Payload::Chat(m) => {
                assert_eq!(m.sender, "alice");
                assert_eq!(m.body, "hi");
            }
            other => panic!("expected chat, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn direct_message_reaches_only_sender_and_destination() {
    let hub = hub();
    let (_a, mut a) = join(&hub, "alice").await;
    let (_b, mut b) = join(&hub, "bob").await;
    let (_c, mut c) = join(&hub, "carol").await;
    drain(&mut a);
    drain(&mut b);

    let delivered = hub
        .route(chat("bob", Destination::peer("alice"), "yo"))
        .await
        .unwrap();
    assert_eq!(delivered, 2);

    assert!(matches!(next(&mut a).await, Payload::Chat(m) if m.body == "yo"));
    assert!(matches!(next(&mut b).await, Payload::Chat(m) if m.body == "yo"));
    assert!(drain(&mut c).is_empty());
}

#[tokio::test]
async fn direct_message_to_missing_peer_is_dropped() {
    let hub = hub();
    let (_a, mut a) = join(&hub, "alice").await;

    let delivered = hub
        .route(chat("alice", Destination::peer("nobody"), "hello?"))
        .await
        .unwrap();
    assert_eq!(delivered, 0);
    assert!(drain(&mut a).is_empty());
}

#[tokio::test]
async fn unregister_is_idempotent_and_rebroadcasts_roster() {
    let hub = hub();
    let (a_id, _a) = join(&hub, "alice").await;
    let (_b_id, mut b) = join(&hub, "bob").await;

    assert!(hub.unregister(a_id).await.unwrap());
    assert!(!hub.unregister(a_id).await.unwrap());

    match next(&mut b).await {
        Payload::Roster(snap) => assert_eq!(snap.members, vec!["bob"]),
        other => panic!("expected roster, got {other:?}"),
    }
    assert!(drain(&mut b).is_empty());
}

#[tokio::test]
async fn unregister_keeps_stale_roster_when_disabled() {
    let hub = HubHandle::spawn(&HubSection {
        roster_on_leave: false,
        ..HubSection::default()
    });
    let (a_id, _a) = join(&hub, "alice").await;
    let (_b_id, mut b) = join(&hub, "bob").await;

    assert!(hub.unregister(a_id).await.unwrap());
    assert_eq!(hub.roster().await.unwrap(), vec!["bob"]);
    assert!(drain(&mut b).is_empty());
}

#[tokio::test]
async fn full_or_closed_peer_does_not_block_others() {
    let hub = hub();

    // Capacity 2: accept + roster fill it; nothing drains it afterwards.
    let (slow, _slow_rx) = session_with_capacity(&hub, "slow", 2);
    hub.register(slow).await.unwrap();

    let (gone, gone_rx) = session(&hub, "gone");
    hub.register(gone).await.unwrap();
    drop(gone_rx);

    let (_b, mut b) = join(&hub, "bob").await;

    let delivered = timeout(
        Duration::from_secs(1),
        hub.route(chat("bob", Destination::All, "still here")),
    )
    .await
    .expect("hub stalled")
    .unwrap();
    assert_eq!(delivered, 1);
    assert!(matches!(next(&mut b).await, Payload::Chat(m) if m.body == "still here"));

    // Failed deliveries never unregister anybody.
    assert_eq!(hub.roster().await.unwrap(), vec!["slow", "gone", "bob"]);
}
