use serde::{Deserialize, Serialize};

pub type ConnectionId = u16;
pub type RoomKey = String;
/// Identifies one armed expiry timer of an empty room.
pub type GcTicket = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ConnectionId,
    pub username: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    pub user_id: ConnectionId,
    pub username: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatus {
    pub room_id: RoomKey,
    pub users: Vec<Participant>,
    pub history_length: usize,
    pub has_state: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub status: String,
    pub rooms: usize,
    pub total_users: usize,
    /// Open connections, joined to a room or not.
    pub connections: usize,
}
