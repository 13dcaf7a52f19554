use futures::StreamExt;
use nowbar_core::{PlayerEvent, PlayerId, SourceError};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use zbus::fdo::DBusProxy;
use zbus::Connection;

use crate::EventSender;

/// Subscribe to `NameOwnerChanged` and forward MPRIS names coming and going.
pub async fn watch(events: EventSender) -> Result<JoinHandle<()>, SourceError> {
    let connection = Connection::session()
        .await
        .map_err(|e| SourceError::Unavailable(format!("failed to connect to D-Bus: {e}")))?;
    let proxy = DBusProxy::new(&connection)
        .await
        .map_err(|e| SourceError::Bus(e.to_string()))?;
    let mut changes = proxy
        .receive_name_owner_changed()
        .await
        .map_err(|e| SourceError::Bus(e.to_string()))?;

    info!("watching session bus for MPRIS players");
    Ok(tokio::spawn(async move {
        let _proxy = proxy;
        while let Some(signal) = changes.next().await {
            let args = match signal.args() {
                Ok(args) => args,
                Err(e) => {
                    debug!(error = %e, "malformed NameOwnerChanged signal");
                    continue;
                }
            };
            let event = name_change(
                args.name().as_str(),
                args.old_owner().is_some(),
                args.new_owner().is_some(),
            );
            if let Some(event) = event {
                if events.send(event).is_err() {
                    break;
                }
            }
        }
        debug!("bus name watch ended");
    }))
}

/// Interpret one ownership change. Owner handovers between two live
/// connections are neither an appearance nor a disappearance.
pub fn name_change(name: &str, had_owner: bool, has_owner: bool) -> Option<PlayerEvent> {
    let id = PlayerId::from_bus_name(name)?;
    match (had_owner, has_owner) {
        (false, true) => Some(PlayerEvent::Appeared(id)),
        (true, false) => Some(PlayerEvent::Vanished(id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_change_appear_and_vanish() {
        assert_eq!(
            name_change("org.mpris.MediaPlayer2.spotify", false, true),
            Some(PlayerEvent::Appeared(PlayerId::new("spotify")))
        );
        assert_eq!(
            name_change("org.mpris.MediaPlayer2.firefox.instance_1_8", true, false),
            Some(PlayerEvent::Vanished(PlayerId::new("firefox.instance_1_8")))
        );
    }

    #[test]
    fn test_name_change_ignores_other_names_and_handovers() {
        assert_eq!(name_change("org.freedesktop.Notifications", false, true), None);
        assert_eq!(name_change(":1.42", false, true), None);
        assert_eq!(name_change("org.mpris.MediaPlayer2.mpv", true, true), None);
    }
}
