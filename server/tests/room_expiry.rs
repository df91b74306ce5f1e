use std::time::Duration;

use server::admin::AdminCommand;
use server::connection::ConnectionEvent;
use server::server::{spawn_server, ServerCommand, ServerSettings, ServerTx};
use system::message::{InboundEvent, JoinRoom, OutboundEvent, Stroke, StrokeKind, Verbatim};
use system::{ConnectionId, RoomStatus, ServerStatus};
use tokio::sync::mpsc::{channel, Receiver};
use tokio::sync::oneshot;

const GRACE: Duration = Duration::from_secs(300);

fn start() -> ServerTx {
    spawn_server(ServerSettings {
        grace_period: GRACE,
        history_limit: 100,
    })
}

async fn connect(srv_tx: &ServerTx) -> (ConnectionId, Receiver<ConnectionEvent>) {
    let (tx, mut rx) = channel(64);
    srv_tx.send(ServerCommand::Connect { tx }).expect("");
    match rx.recv().await {
        Some(ConnectionEvent::Connected { connection_id }) => (connection_id, rx),
        other => panic!("unexpected {:?}", other),
    }
}

fn send(srv_tx: &ServerTx, from: ConnectionId, event: InboundEvent) {
    srv_tx
        .send(ServerCommand::Inbound { from, event })
        .expect("");
}

fn join(srv_tx: &ServerTx, from: ConnectionId, room: &str, name: &str) {
    send(
        srv_tx,
        from,
        InboundEvent::JoinRoom(JoinRoom {
            room_id: room.into(),
            username: name.into(),
            color: "#ff0000".into(),
        }),
    );
}

async fn room_status(srv_tx: &ServerTx, room: &str) -> Option<RoomStatus> {
    let (tx, rx) = oneshot::channel();
    srv_tx
        .send(ServerCommand::AdminCommand(AdminCommand::GetRoomStatus {
            room_key: room.into(),
            tx,
        }))
        .expect("");
    rx.await.expect("")
}

async fn server_status(srv_tx: &ServerTx) -> ServerStatus {
    let (tx, rx) = oneshot::channel();
    srv_tx
        .send(ServerCommand::AdminCommand(AdminCommand::GetServerStatus { tx }))
        .expect("");
    rx.await.expect("")
}

fn drain(rx: &mut Receiver<ConnectionEvent>) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ConnectionEvent::Outbound(event) = event {
            events.push(event);
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn it_deletes_empty_room_after_grace_period() {
    let srv_tx = start();
    let (alice, _rx) = connect(&srv_tx).await;
    join(&srv_tx, alice, "R2", "Alice");
    srv_tx
        .send(ServerCommand::Disconnect { from: alice })
        .expect("");

    assert!(room_status(&srv_tx, "R2").await.is_some());

    tokio::time::sleep(GRACE - Duration::from_secs(1)).await;
    assert!(room_status(&srv_tx, "R2").await.is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(room_status(&srv_tx, "R2").await.is_none());
    assert_eq!(server_status(&srv_tx).await.rooms, 0);
}

#[tokio::test(start_paused = true)]
async fn it_keeps_room_rejoined_within_grace_window() {
    let srv_tx = start();
    let (alice, _rx) = connect(&srv_tx).await;
    join(&srv_tx, alice, "R2", "Alice");
    srv_tx
        .send(ServerCommand::Disconnect { from: alice })
        .expect("");

    tokio::time::sleep(Duration::from_secs(100)).await;
    let (alice_again, _rx_again) = connect(&srv_tx).await;
    join(&srv_tx, alice_again, "R2", "Alice");

    tokio::time::sleep(GRACE).await;
    let status = room_status(&srv_tx, "R2").await.expect("room must survive");
    assert_eq!(status.users.len(), 1);
    assert_eq!(status.users[0].id, alice_again);

    srv_tx
        .send(ServerCommand::Disconnect { from: alice_again })
        .expect("");
    tokio::time::sleep(GRACE + Duration::from_secs(1)).await;
    assert!(room_status(&srv_tx, "R2").await.is_none());
}

#[tokio::test]
async fn it_relays_strokes_to_other_members_only() {
    let srv_tx = start();
    let (alice, mut alice_rx) = connect(&srv_tx).await;
    let (bob, mut bob_rx) = connect(&srv_tx).await;
    join(&srv_tx, alice, "R1", "Alice");
    join(&srv_tx, bob, "R1", "Bob");

    let stroke = Verbatim::from_payload(&Stroke {
        kind: StrokeKind::Start,
        x: 10.0,
        y: 10.0,
        color: "#ff0000".into(),
        width: 2.0,
        tool: "brush".into(),
    })
    .expect("");
    send(&srv_tx, alice, InboundEvent::Draw(stroke.clone()));
    assert_eq!(room_status(&srv_tx, "R1").await.expect("").history_length, 1);

    let alice_events = drain(&mut alice_rx);
    let bob_events = drain(&mut bob_rx);
    assert!(!alice_events.contains(&OutboundEvent::Draw(stroke.clone())));
    assert!(bob_events.contains(&OutboundEvent::Draw(stroke)));
}

#[tokio::test]
async fn it_disconnects_connections_whose_channel_closed() {
    let srv_tx = start();
    let (alice, _alice_rx) = connect(&srv_tx).await;
    let (bob, bob_rx) = connect(&srv_tx).await;
    join(&srv_tx, alice, "R1", "Alice");
    join(&srv_tx, bob, "R1", "Bob");
    drop(bob_rx);

    send(&srv_tx, alice, InboundEvent::ClearCanvas);

    let status = room_status(&srv_tx, "R1").await.expect("");
    assert_eq!(status.users.len(), 1);
    assert_eq!(status.users[0].id, alice);
}

#[tokio::test]
async fn it_reclaims_connection_closed_before_id_assignment() {
    let srv_tx = start();
    let (tx, rx) = channel(64);
    srv_tx.send(ServerCommand::Connect { tx }).expect("");
    drop(rx);

    assert_eq!(server_status(&srv_tx).await.connections, 0);

    let (_alice, _alice_rx) = connect(&srv_tx).await;
    assert_eq!(server_status(&srv_tx).await.connections, 1);
}

#[tokio::test]
async fn it_reclaims_abandoned_connection() {
    let srv_tx = start();
    let (tx, _rx) = channel(64);
    srv_tx
        .send(ServerCommand::Connect { tx: tx.clone() })
        .expect("");
    srv_tx.send(ServerCommand::Abandon { tx }).expect("");

    assert_eq!(server_status(&srv_tx).await.connections, 0);
}
