use std::collections::HashMap;

use crate::{ConnectionId, CursorState};

/// Last known pointer position per connection. No movement history is kept.
#[derive(Debug, Default)]
pub struct CursorTracker {
    cursors: HashMap<ConnectionId, CursorState>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, cursor: CursorState) {
        self.cursors.insert(cursor.user_id, cursor);
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<CursorState> {
        self.cursors.remove(connection_id)
    }

    /// Every known cursor except the one owned by `except`.
    pub fn others(&self, except: &ConnectionId) -> Vec<CursorState> {
        self.cursors
            .values()
            .filter(|c| &c.user_id != except)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(id: ConnectionId, x: f64, y: f64) -> CursorState {
        CursorState {
            user_id: id,
            username: format!("user{}", id),
            color: "#123456".into(),
            x,
            y,
        }
    }

    #[test]
    fn it_overwrites_position_in_place() {
        let mut tracker = CursorTracker::new();
        tracker.update(cursor(1, 0.0, 0.0));
        tracker.update(cursor(1, 5.0, 6.0));

        let cursors = tracker.others(&0);
        assert_eq!(cursors.len(), 1);
        assert_eq!((cursors[0].x, cursors[0].y), (5.0, 6.0));
    }

    #[test]
    fn it_excludes_requesting_connection_from_others() {
        let mut tracker = CursorTracker::new();
        tracker.update(cursor(1, 0.0, 0.0));
        tracker.update(cursor(2, 1.0, 1.0));

        let others = tracker.others(&1);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].user_id, 2);
    }

    #[test]
    fn it_drops_cursor_on_remove() {
        let mut tracker = CursorTracker::new();
        tracker.update(cursor(1, 0.0, 0.0));

        assert!(tracker.remove(&1).is_some());
        assert!(tracker.others(&0).is_empty());
    }
}
