use thiserror::Error;

use crate::models::PlayerId;

/// Failure talking to the transport service or to one player behind it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The player handle no longer answers (it is going away).
    #[error("player {0} is no longer reachable")]
    Stale(PlayerId),

    #[error("bus error: {0}")]
    Bus(String),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Source(#[from] SourceError),

    #[error("output error: {0}")]
    Output(std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether the consumer closed its end of the output pipe.
    pub fn is_output_closed(&self) -> bool {
        matches!(self, CoreError::Output(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}
