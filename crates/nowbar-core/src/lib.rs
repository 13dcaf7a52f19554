pub mod activity;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod output;
pub mod registry;
pub mod selector;

pub use aggregator::Aggregator;
pub use error::{CoreError, SourceError};
pub use events::{PlayerEvent, PlayerSource};
pub use models::{PlaybackStatus, PlayerId, PlayerState, TrackMetadata};
