use system::{RoomKey, RoomStatus, ServerStatus};
use tokio::sync::oneshot::Sender;

/// Read-only queries answered by the server task.
#[derive(Debug)]
pub enum AdminCommand {
    GetServerStatus {
        tx: Sender<ServerStatus>,
    },
    GetRoomStatus {
        room_key: RoomKey,
        tx: Sender<Option<RoomStatus>>,
    },
}
