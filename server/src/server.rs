use std::num::Wrapping;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender, WeakUnboundedSender};

use system::message::InboundEvent;
use system::{ConnectionId, Effect, GcTicket, Relay, RoomKey};

use crate::admin::AdminCommand;
use crate::config::Config;
use crate::connection::ConnectionEvent;
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage, DeliveryError};

pub type ServerTx = UnboundedSender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    Connect {
        tx: ConnectionTx,
    },
    /// The connection closed before it learned its id.
    Abandon {
        tx: ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    Inbound {
        from: ConnectionId,
        event: InboundEvent,
    },
    ExpireRoom {
        room_key: RoomKey,
        ticket: GcTicket,
    },
    AdminCommand(AdminCommand),
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub grace_period: Duration,
    pub history_limit: usize,
}

impl From<&Config> for ServerSettings {
    fn from(config: &Config) -> Self {
        Self {
            grace_period: config.grace_period(),
            history_limit: config.history_limit,
        }
    }
}

/// Owns all room state. Commands are handled one at a time, so no locking is needed.
struct Server {
    relay: Relay,
    connections: ConnectionTxStorage,
    connection_id_source: Wrapping<ConnectionId>,
    grace_period: Duration,
    srv_tx: WeakUnboundedSender<ServerCommand>,
}

impl Server {
    fn new(settings: ServerSettings, srv_tx: WeakUnboundedSender<ServerCommand>) -> Self {
        Self {
            relay: Relay::new(settings.history_limit),
            connections: ConnectionTxStorage::new(),
            connection_id_source: Wrapping(0),
            grace_period: settings.grace_period,
            srv_tx,
        }
    }

    fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connect { tx } => {
                let connection_id = self.new_connection_id();
                self.connections.insert(connection_id, tx);
                log::info!("User connected: {}", connection_id);
                if let Some(closed) =
                    self.deliver(connection_id, ConnectionEvent::Connected { connection_id })
                {
                    self.disconnect(closed);
                }
            }
            ServerCommand::Abandon { tx } => match self.connections.find(&tx) {
                Some(connection_id) => self.disconnect(connection_id),
                None => log::debug!("Abandoned connection was already removed"),
            },
            ServerCommand::Disconnect { from } => self.disconnect(from),
            ServerCommand::Inbound { from, event } => {
                if self.connections.contains(&from) {
                    let effects = self.relay.handle(from, event);
                    self.apply(effects);
                } else {
                    log::debug!("Dropped event from unknown connection {}", from);
                }
            }
            ServerCommand::ExpireRoom { room_key, ticket } => {
                if !self.relay.expire_room(&room_key, ticket) {
                    log::debug!("Room {} kept (ticket {} is stale)", room_key, ticket);
                }
            }
            ServerCommand::AdminCommand(command) => self.handle_admin_command(command),
        }
    }

    fn handle_admin_command(&self, command: AdminCommand) {
        match command {
            AdminCommand::GetServerStatus { tx } => {
                let _ = tx.send(self.relay.status(self.connections.len()));
            }
            AdminCommand::GetRoomStatus { room_key, tx } => {
                let _ = tx.send(self.relay.room_status(&room_key));
            }
        }
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        if self.connections.remove(&connection_id).is_some() {
            log::info!("User disconnected: {}", connection_id);
            let effects = self.relay.disconnect(connection_id);
            self.apply(effects);
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        let mut closed = Vec::new();
        for effect in effects {
            match effect {
                Effect::Send { to, event } => {
                    if let Some(to) = self.deliver(to, ConnectionEvent::Outbound(event)) {
                        closed.push(to);
                    }
                }
                Effect::ScheduleExpiry { room_key, ticket } => {
                    self.schedule_expiry(room_key, ticket)
                }
            }
        }
        for connection_id in closed {
            self.disconnect(connection_id);
        }
    }

    /// Returns the id back when the connection turned out to be closed.
    fn deliver(&self, to: ConnectionId, event: ConnectionEvent) -> Option<ConnectionId> {
        match self.connections.send(&to, event) {
            Ok(()) => None,
            Err(DeliveryError::Closed(to)) => {
                log::debug!("Connection {} closed before delivery", to);
                Some(to)
            }
            Err(err) => {
                log::warn!("Dropped outbound event: {}", err);
                None
            }
        }
    }

    fn schedule_expiry(&self, room_key: RoomKey, ticket: GcTicket) {
        log::debug!(
            "Room {} is empty; deleting in {:?} unless rejoined",
            room_key,
            self.grace_period
        );
        let srv_tx = self.srv_tx.clone();
        let grace_period = self.grace_period;
        tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            if let Some(srv_tx) = srv_tx.upgrade() {
                let _ = srv_tx.send(ServerCommand::ExpireRoom { room_key, ticket });
            }
        });
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        loop {
            self.connection_id_source += Wrapping(1);
            let connection_id = self.connection_id_source.0;
            if !self.connections.contains(&connection_id) {
                return connection_id;
            }
        }
    }
}

pub fn spawn_server(settings: ServerSettings) -> ServerTx {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ServerCommand>();
    let mut server = Box::new(Server::new(settings, srv_tx.downgrade()));

    tokio::spawn(async move {
        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command);
        }
        log::info!("Server task terminated");
    });

    srv_tx
}
