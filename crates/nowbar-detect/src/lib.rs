//! Transport service for nowbar: MPRIS2 players on the D-Bus session bus.

pub mod platform;

use nowbar_core::PlayerEvent;
use tokio::sync::mpsc::UnboundedSender;

pub use platform::{open, watch_bus_names};

/// Channel end the transport pushes player events into.
pub type EventSender = UnboundedSender<PlayerEvent>;
