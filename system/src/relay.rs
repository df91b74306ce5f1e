//! Routes inbound connection events to the members of the sender's room.
//!
//! The relay performs no I/O. Every operation appends [`Effect`]s that the
//! caller executes: deliveries to connections and expiry timers for rooms
//! that became empty.

use std::collections::HashMap;

use chrono::Utc;

use crate::history::{DrawOperation, HistoryEntry, ImagePlacement};
use crate::message::{CanvasState, CursorMove, InboundEvent, JoinRoom, OutboundEvent, UserLeft};
use crate::{
    ConnectionId, CursorState, GcTicket, Participant, RelayError, RelayResult, Room,
    RoomKey, RoomRegistry, RoomStatus, ServerStatus,
};

/// Which members of a room receive a relayed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// Every member except the one who sent the event.
    ExcludeSender,
    /// Every member, the sender included.
    IncludeAll,
}

impl FanOut {
    fn admits(self, sender: &ConnectionId, recipient: &ConnectionId) -> bool {
        match self {
            FanOut::ExcludeSender => sender != recipient,
            FanOut::IncludeAll => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send {
        to: ConnectionId,
        event: OutboundEvent,
    },
    ScheduleExpiry {
        room_key: RoomKey,
        ticket: GcTicket,
    },
}

/// What a joining connection needs to reconstruct the visible canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub checkpoint: Option<String>,
    pub cursors: Vec<CursorState>,
}

pub struct Relay {
    registry: RoomRegistry,
    locations: HashMap<ConnectionId, RoomKey>,
}

impl Relay {
    pub fn new(history_limit: usize) -> Self {
        Self {
            registry: RoomRegistry::new(history_limit),
            locations: HashMap::new(),
        }
    }

    /// Processes one inbound event. Events that cannot be applied are dropped.
    pub fn handle(&mut self, from: ConnectionId, event: InboundEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        let result = match event {
            InboundEvent::JoinRoom(request) => {
                let view = self.join(from, request, &mut effects);
                if let Some(snapshot) = view.checkpoint {
                    effects.push(Effect::Send {
                        to: from,
                        event: OutboundEvent::CanvasState(CanvasState {
                            snapshot: Some(snapshot),
                        }),
                    });
                }
                for cursor in view.cursors {
                    effects.push(Effect::Send {
                        to: from,
                        event: OutboundEvent::CursorMove(cursor),
                    });
                }
                Ok(())
            }
            InboundEvent::LeaveRoom => self.leave(from, &mut effects),
            InboundEvent::Draw(stroke) => self.relay_drawing(
                from,
                DrawOperation::Stroke(stroke.get().clone()),
                OutboundEvent::Draw(stroke),
                &mut effects,
            ),
            InboundEvent::DrawShape(shape) => self.relay_drawing(
                from,
                DrawOperation::Shape(shape.get().clone()),
                OutboundEvent::DrawShape(shape),
                &mut effects,
            ),
            InboundEvent::DrawText(text) => self.relay_drawing(
                from,
                DrawOperation::Text(text.get().clone()),
                OutboundEvent::DrawText(text),
                &mut effects,
            ),
            InboundEvent::DrawImage(image) => self.relay_drawing(
                from,
                DrawOperation::Image(ImagePlacement::from(image.get())),
                OutboundEvent::DrawImage(image),
                &mut effects,
            ),
            InboundEvent::CursorMove(position) => {
                self.move_cursor(from, position, &mut effects)
            }
            InboundEvent::ClearCanvas => self.clear(from, &mut effects),
            InboundEvent::SaveCanvas(snapshot) => self.save_checkpoint(from, snapshot),
            InboundEvent::RequestCanvasState => {
                self.load_checkpoint(from).map(|snapshot| {
                    effects.push(Effect::Send {
                        to: from,
                        event: OutboundEvent::CanvasState(CanvasState { snapshot }),
                    })
                })
            }
            InboundEvent::Ping(ping) => {
                effects.push(Effect::Send {
                    to: from,
                    event: OutboundEvent::Pong(ping),
                });
                Ok(())
            }
        };

        if let Err(err) = result {
            log::debug!("Dropped event from connection {}: {}", from, err);
        }
        effects
    }

    /// Same cleanup as an explicit leave. Unjoined connections are ignored.
    pub fn disconnect(&mut self, from: ConnectionId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Err(err) = self.leave(from, &mut effects) {
            log::debug!("Disconnect of connection {}: {}", from, err);
        }
        effects
    }

    /// Attaches `from` to the requested room. A connection already placed in a
    /// room leaves it first.
    pub fn join(
        &mut self,
        from: ConnectionId,
        request: JoinRoom,
        effects: &mut Vec<Effect>,
    ) -> RoomView {
        if self.locations.contains_key(&from) {
            let _ = self.leave(from, effects);
        }

        let participant = Participant {
            id: from,
            username: request.username,
            color: request.color,
        };
        log::info!("{} joined room: {}", participant.username, request.room_id);

        let room = self.registry.join(&request.room_id, participant);
        fan_out(
            room,
            &from,
            FanOut::IncludeAll,
            OutboundEvent::UsersUpdate(room.presence.list()),
            effects,
        );
        log::info!("Room {} now has {} users", room.key, room.presence.len());

        let view = RoomView {
            checkpoint: room.checkpoint.load().map(str::to_owned),
            cursors: room.cursors.others(&from),
        };
        self.locations.insert(from, request.room_id);
        view
    }

    pub fn leave(&mut self, from: ConnectionId, effects: &mut Vec<Effect>) -> RelayResult<()> {
        let room_key = self
            .locations
            .remove(&from)
            .ok_or(RelayError::NotJoined(from))?;
        let (participant, ticket) = self
            .registry
            .leave(&room_key, &from)
            .ok_or_else(|| RelayError::UnknownRoom(room_key.clone()))?;

        if let Some(room) = self.registry.get(&room_key) {
            fan_out(
                room,
                &from,
                FanOut::ExcludeSender,
                OutboundEvent::UserLeft(UserLeft { user_id: from }),
                effects,
            );
            fan_out(
                room,
                &from,
                FanOut::IncludeAll,
                OutboundEvent::UsersUpdate(room.presence.list()),
                effects,
            );
            log::info!("{} left room: {}", participant.username, room_key);
            log::info!("Room {} now has {} users", room_key, room.presence.len());
        }

        if let Some(ticket) = ticket {
            effects.push(Effect::ScheduleExpiry { room_key, ticket });
        }
        Ok(())
    }

    pub fn move_cursor(
        &mut self,
        from: ConnectionId,
        position: CursorMove,
        effects: &mut Vec<Effect>,
    ) -> RelayResult<()> {
        let (room, participant) = self.locate(from)?;
        let cursor = CursorState {
            user_id: from,
            username: participant.username,
            color: participant.color,
            x: position.x,
            y: position.y,
        };
        room.cursors.update(cursor.clone());
        fan_out(
            room,
            &from,
            FanOut::ExcludeSender,
            OutboundEvent::CursorMove(cursor),
            effects,
        );
        Ok(())
    }

    fn relay_drawing(
        &mut self,
        from: ConnectionId,
        operation: DrawOperation,
        event: OutboundEvent,
        effects: &mut Vec<Effect>,
    ) -> RelayResult<()> {
        let (room, participant) = self.locate(from)?;
        room.history.append(HistoryEntry {
            operation,
            timestamp: Utc::now(),
            user_id: from,
            username: participant.username,
        });
        fan_out(room, &from, FanOut::ExcludeSender, event, effects);
        Ok(())
    }

    /// Resets the room canvas for everyone, sender included.
    pub fn clear(&mut self, from: ConnectionId, effects: &mut Vec<Effect>) -> RelayResult<()> {
        let (room, _) = self.locate(from)?;
        room.history.clear();
        room.checkpoint.invalidate();
        fan_out(
            room,
            &from,
            FanOut::IncludeAll,
            OutboundEvent::ClearCanvas,
            effects,
        );
        log::info!("Canvas cleared in room: {}", room.key);
        Ok(())
    }

    pub fn save_checkpoint(&mut self, from: ConnectionId, snapshot: String) -> RelayResult<()> {
        let (room, _) = self.locate(from)?;
        room.checkpoint.save(snapshot);
        log::info!("Canvas state saved for room: {}", room.key);
        Ok(())
    }

    pub fn load_checkpoint(&self, from: ConnectionId) -> RelayResult<Option<String>> {
        let room_key = self
            .locations
            .get(&from)
            .ok_or(RelayError::NotJoined(from))?;
        let room = self
            .registry
            .get(room_key)
            .ok_or_else(|| RelayError::UnknownRoom(room_key.clone()))?;
        Ok(room.checkpoint.load().map(str::to_owned))
    }

    pub fn expire_room(&mut self, room_key: &str, ticket: GcTicket) -> bool {
        self.registry.expire(room_key, ticket)
    }

    pub fn status(&self, connections: usize) -> ServerStatus {
        ServerStatus {
            status: "ok".into(),
            rooms: self.registry.room_count(),
            total_users: self.registry.member_count(),
            connections,
        }
    }

    pub fn room_status(&self, room_key: &str) -> Option<RoomStatus> {
        self.registry.get(room_key).map(Room::status)
    }

    fn locate(&mut self, from: ConnectionId) -> RelayResult<(&mut Room, Participant)> {
        let room_key = self
            .locations
            .get(&from)
            .ok_or(RelayError::NotJoined(from))?;
        let room = self
            .registry
            .get_mut(room_key)
            .ok_or_else(|| RelayError::UnknownRoom(room_key.clone()))?;
        let participant = room
            .presence
            .get(&from)
            .cloned()
            .ok_or(RelayError::NotJoined(from))?;
        Ok((room, participant))
    }
}

fn fan_out(
    room: &Room,
    from: &ConnectionId,
    policy: FanOut,
    event: OutboundEvent,
    effects: &mut Vec<Effect>,
) {
    for to in room.presence.connection_ids() {
        if policy.admits(from, to) {
            effects.push(Effect::Send {
                to: *to,
                event: event.clone(),
            });
        }
    }
}
