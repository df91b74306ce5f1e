use thiserror::Error;

use crate::{ConnectionId, RoomKey};

/// Reasons an inbound event is dropped instead of relayed.
#[derive(Debug, Error, PartialEq)]
pub enum RelayError {
    #[error("connection {0} has not joined any room")]
    NotJoined(ConnectionId),

    #[error("room {0} does not exist")]
    UnknownRoom(RoomKey),
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
