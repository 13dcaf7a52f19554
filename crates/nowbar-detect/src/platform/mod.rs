#[cfg(target_os = "linux")]
pub mod bus_names;

#[cfg(target_os = "linux")]
pub mod linux;

use nowbar_core::{PlayerSource, SourceError};

use crate::EventSender;

/// Connect to the platform transport. Event streams of subscribed players
/// are forwarded into `events`.
pub fn open(events: EventSender) -> Result<Box<dyn PlayerSource>, SourceError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::MprisSource::new(events)?))
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = events;
        Err(SourceError::Unavailable(
            "MPRIS players are only supported on Linux".into(),
        ))
    }
}

/// Start watching players appear on and vanish from the bus.
///
/// Returns once the subscription is in place; the watch itself runs as a
/// background task until `events` is closed.
pub async fn watch_bus_names(
    events: EventSender,
) -> Result<tokio::task::JoinHandle<()>, SourceError> {
    #[cfg(target_os = "linux")]
    {
        bus_names::watch(events).await
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = events;
        Err(SourceError::Unavailable(
            "MPRIS players are only supported on Linux".into(),
        ))
    }
}
