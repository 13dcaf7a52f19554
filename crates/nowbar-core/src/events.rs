//! Boundary to the transport service: the events it pushes and the queries
//! the aggregator runs against it.

use crate::error::SourceError;
use crate::models::{PlaybackStatus, PlayerId, PlayerState, TrackMetadata};

/// A notification pushed by the transport service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Appeared(PlayerId),
    Vanished(PlayerId),
    StatusChanged(PlayerId, PlaybackStatus),
    MetadataChanged(PlayerId, TrackMetadata),
}

impl PlayerEvent {
    pub fn player(&self) -> &PlayerId {
        match self {
            PlayerEvent::Appeared(id)
            | PlayerEvent::Vanished(id)
            | PlayerEvent::StatusChanged(id, _)
            | PlayerEvent::MetadataChanged(id, _) => id,
        }
    }
}

/// Query side of the transport service.
///
/// Every call may fail, including for players that vanished a moment ago;
/// callers decide whether a failure is fatal.
pub trait PlayerSource {
    /// Ids of all players currently on the bus.
    fn list_player_names(&mut self) -> Result<Vec<PlayerId>, SourceError>;

    /// Read the current status and metadata of one player.
    fn query(&mut self, id: &PlayerId) -> Result<PlayerState, SourceError>;

    /// Start forwarding status/metadata events for `id`.
    fn subscribe(&mut self, id: &PlayerId) -> Result<(), SourceError>;

    /// Stop forwarding events for `id`. Best effort.
    fn unsubscribe(&mut self, id: &PlayerId) -> Result<(), SourceError>;
}

impl<T: PlayerSource + ?Sized> PlayerSource for Box<T> {
    fn list_player_names(&mut self) -> Result<Vec<PlayerId>, SourceError> {
        (**self).list_player_names()
    }

    fn query(&mut self, id: &PlayerId) -> Result<PlayerState, SourceError> {
        (**self).query(id)
    }

    fn subscribe(&mut self, id: &PlayerId) -> Result<(), SourceError> {
        (**self).subscribe(id)
    }

    fn unsubscribe(&mut self, id: &PlayerId) -> Result<(), SourceError> {
        (**self).unsubscribe(id)
    }
}
