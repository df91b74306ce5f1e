use crate::checkpoint::Checkpoint;
use crate::cursor::CursorTracker;
use crate::history::HistoryLog;
use crate::presence::Presence;
use crate::{GcTicket, RoomKey, RoomStatus};

pub struct Room {
    pub key: RoomKey,
    pub presence: Presence,
    pub cursors: CursorTracker,
    pub history: HistoryLog,
    pub checkpoint: Checkpoint,
    /// Ticket of the expiry timer armed when the room last became empty.
    pub pending_expiry: Option<GcTicket>,
}

impl Room {
    pub fn new(key: RoomKey, history_limit: usize) -> Self {
        Self {
            key,
            presence: Presence::new(),
            cursors: CursorTracker::new(),
            history: HistoryLog::new(history_limit),
            checkpoint: Checkpoint::new(),
            pending_expiry: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }

    pub fn status(&self) -> RoomStatus {
        RoomStatus {
            room_id: self.key.clone(),
            users: self.presence.list(),
            history_length: self.history.len(),
            has_state: self.checkpoint.is_present(),
        }
    }
}
