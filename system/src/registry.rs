use std::collections::HashMap;

use crate::{ConnectionId, GcTicket, Participant, Room, RoomKey};

/// Owns every live room, keyed by room key. Rooms are created on first join
/// and removed only through [`RoomRegistry::expire`].
pub struct RoomRegistry {
    rooms: HashMap<RoomKey, Room>,
    history_limit: usize,
    ticket_source: GcTicket,
}

impl RoomRegistry {
    pub fn new(history_limit: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            history_limit,
            ticket_source: 0,
        }
    }

    /// Attaches `participant` to `room_key`, creating the room if needed. Any
    /// pending expiry of the room is invalidated.
    pub fn join(&mut self, room_key: &str, participant: Participant) -> &mut Room {
        let history_limit = self.history_limit;
        let room = self.rooms.entry(room_key.to_owned()).or_insert_with(|| {
            log::info!("Room {} created", room_key);
            Room::new(room_key.to_owned(), history_limit)
        });
        room.pending_expiry = None;
        room.presence.insert(participant);
        room
    }

    /// Detaches a connection from `room_key`. Returns the removed participant
    /// and, when the room became empty, the ticket of its newly armed expiry.
    pub fn leave(
        &mut self,
        room_key: &str,
        connection_id: &ConnectionId,
    ) -> Option<(Participant, Option<GcTicket>)> {
        let room = self.rooms.get_mut(room_key)?;
        let participant = room.presence.remove(connection_id)?;
        room.cursors.remove(connection_id);

        let ticket = if room.is_empty() {
            self.ticket_source += 1;
            room.pending_expiry = Some(self.ticket_source);
            Some(self.ticket_source)
        } else {
            None
        };
        Some((participant, ticket))
    }

    /// Deletes the room if it is still empty and `ticket` is still the armed one.
    pub fn expire(&mut self, room_key: &str, ticket: GcTicket) -> bool {
        let expired = self
            .rooms
            .get(room_key)
            .map(|room| room.is_empty() && room.pending_expiry == Some(ticket))
            .unwrap_or(false);
        if expired {
            self.rooms.remove(room_key);
            log::info!("Room {} deleted (empty)", room_key);
        }
        expired
    }

    pub fn get(&self, room_key: &str) -> Option<&Room> {
        self.rooms.get(room_key)
    }

    pub fn get_mut(&mut self, room_key: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_key)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self) -> usize {
        self.rooms.values().map(|room| room.presence.len()).sum()
    }
}
