use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known bus name prefix every MPRIS2 player owns.
pub const MPRIS_BUS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Stable identifier of one player: its bus name without the MPRIS prefix.
///
/// Browsers and some players append an instance suffix
/// (`firefox.instance_1_42`), so two instances of the same program stay
/// distinct here while sharing the same [`PlayerId::name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a full bus name. Returns `None` for names that are not MPRIS players.
    pub fn from_bus_name(bus_name: &str) -> Option<Self> {
        bus_name
            .strip_prefix(MPRIS_BUS_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(Self::new)
    }

    /// Player name without any instance suffix (`firefox.instance_1_42` → `firefox`).
    pub fn name(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bus_name(&self) -> String {
        format!("{MPRIS_BUS_PREFIX}{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Playback status as reported by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
    #[default]
    Unknown,
}

impl PlaybackStatus {
    pub fn bucket(self) -> Bucket {
        match self {
            PlaybackStatus::Playing => Bucket::Playing,
            PlaybackStatus::Paused => Bucket::Paused,
            PlaybackStatus::Stopped | PlaybackStatus::Unknown => Bucket::Other,
        }
    }

    /// Parse the MPRIS `PlaybackStatus` property string.
    pub fn from_mpris(value: &str) -> Self {
        match value {
            "Playing" => PlaybackStatus::Playing,
            "Paused" => PlaybackStatus::Paused,
            "Stopped" => PlaybackStatus::Stopped,
            _ => PlaybackStatus::Unknown,
        }
    }
}

/// Selection partition. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Playing,
    Paused,
    Other,
}

/// Track metadata as far as the status line cares about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: Option<String>,
    /// All artists joined with ", ".
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Opaque `mpris:trackid`; only inspected for advertisement markers.
    pub track_id: Option<String>,
}

impl TrackMetadata {
    /// Title trimmed, `None` when absent or blank.
    pub fn display_title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// Artist trimmed, `None` when absent or blank.
    pub fn display_artist(&self) -> Option<&str> {
        non_blank(self.artist.as_deref())
    }

    pub fn display_album(&self) -> Option<&str> {
        non_blank(self.album.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Result of one successful property read on a player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub status: PlaybackStatus,
    pub metadata: TrackMetadata,
}

/// A registered player that answered its latest query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePlayer {
    pub id: PlayerId,
    pub state: PlayerState,
    /// Registration sequence number, used as the final tie-breaker.
    pub order: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_from_bus_name() {
        let id = PlayerId::from_bus_name("org.mpris.MediaPlayer2.spotify").unwrap();
        assert_eq!(id.as_str(), "spotify");
        assert_eq!(id.bus_name(), "org.mpris.MediaPlayer2.spotify");

        assert!(PlayerId::from_bus_name("org.freedesktop.Notifications").is_none());
        assert!(PlayerId::from_bus_name("org.mpris.MediaPlayer2.").is_none());
    }

    #[test]
    fn test_player_id_name_strips_instance() {
        let id = PlayerId::new("firefox.instance_1_42");
        assert_eq!(id.name(), "firefox");
        assert_eq!(id.as_str(), "firefox.instance_1_42");
        assert_eq!(PlayerId::new("mpv").name(), "mpv");
    }

    #[test]
    fn test_status_buckets() {
        assert_eq!(PlaybackStatus::Playing.bucket(), Bucket::Playing);
        assert_eq!(PlaybackStatus::Paused.bucket(), Bucket::Paused);
        assert_eq!(PlaybackStatus::Stopped.bucket(), Bucket::Other);
        assert_eq!(PlaybackStatus::Unknown.bucket(), Bucket::Other);
        assert!(Bucket::Playing < Bucket::Paused && Bucket::Paused < Bucket::Other);
    }

    #[test]
    fn test_status_from_mpris() {
        assert_eq!(PlaybackStatus::from_mpris("Playing"), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::from_mpris("Paused"), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::from_mpris("Stopped"), PlaybackStatus::Stopped);
        assert_eq!(PlaybackStatus::from_mpris("garbage"), PlaybackStatus::Unknown);
    }

    #[test]
    fn test_blank_metadata_is_absent() {
        let meta = TrackMetadata {
            title: Some("   ".into()),
            artist: Some(" Daft Punk ".into()),
            ..Default::default()
        };
        assert_eq!(meta.display_title(), None);
        assert_eq!(meta.display_artist(), Some("Daft Punk"));
        assert_eq!(meta.display_album(), None);
    }
}
