use std::collections::HashMap;

use system::ConnectionId;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;

use crate::connection::ConnectionEvent;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

#[derive(Debug, Error, PartialEq)]
pub enum DeliveryError {
    #[error("connection {0} is not registered")]
    Unknown(ConnectionId),

    #[error("outbound buffer of connection {0} is full")]
    Full(ConnectionId),

    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connection_txs.contains_key(connection_id)
    }

    /// Never waits: a slow connection loses events instead of stalling the server.
    pub fn send(&self, to: &ConnectionId, event: ConnectionEvent) -> Result<(), DeliveryError> {
        let tx = self
            .connection_txs
            .get(to)
            .ok_or(DeliveryError::Unknown(*to))?;
        tx.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::Full(*to),
            TrySendError::Closed(_) => DeliveryError::Closed(*to),
        })
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }

    /// Id registered for the channel `tx` belongs to.
    pub fn find(&self, tx: &ConnectionTx) -> Option<ConnectionId> {
        self.connection_txs
            .iter()
            .find(|(_, registered)| registered.same_channel(tx))
            .map(|(connection_id, _)| *connection_id)
    }

    pub fn len(&self) -> usize {
        self.connection_txs.len()
    }
}
