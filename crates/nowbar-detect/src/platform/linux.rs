use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mpris::{Event, FindingError, Metadata, MetadataValue, Player, PlayerFinder};
use nowbar_core::{
    PlaybackStatus, PlayerEvent, PlayerId, PlayerSource, PlayerState, SourceError, TrackMetadata,
};
use tracing::{debug, warn};

use crate::EventSender;

/// MPRIS players reached through the `mpris` crate.
///
/// Player handles are cached per id and dropped as soon as a query on them
/// fails. Each subscription runs the player's blocking event iterator on
/// its own thread and forwards what it sees into the event channel.
pub struct MprisSource {
    finder: PlayerFinder,
    handles: HashMap<PlayerId, Player>,
    watchers: HashMap<PlayerId, Arc<AtomicBool>>,
    events: EventSender,
}

impl MprisSource {
    pub fn new(events: EventSender) -> Result<Self, SourceError> {
        let finder = PlayerFinder::new()
            .map_err(|e| SourceError::Unavailable(format!("failed to connect to D-Bus: {e}")))?;
        Ok(Self {
            finder,
            handles: HashMap::new(),
            watchers: HashMap::new(),
            events,
        })
    }

    fn handle(&mut self, id: &PlayerId) -> Result<&Player, SourceError> {
        if !self.handles.contains_key(id) {
            let player = find_player(&self.finder, id)?;
            self.handles.insert(id.clone(), player);
        }
        self.handles
            .get(id)
            .ok_or_else(|| SourceError::Stale(id.clone()))
    }

    fn read_state(&mut self, id: &PlayerId) -> Result<PlayerState, SourceError> {
        let player = self.handle(id)?;
        let status = player
            .get_playback_status()
            .map_err(|e| query_error(player, id, e))?;
        let metadata = player
            .get_metadata()
            .map_err(|e| query_error(player, id, e))?;
        Ok(PlayerState {
            status: map_status(status),
            metadata: track_metadata(&metadata),
        })
    }
}

impl PlayerSource for MprisSource {
    fn list_player_names(&mut self) -> Result<Vec<PlayerId>, SourceError> {
        match self.finder.find_all() {
            Ok(players) => Ok(players
                .iter()
                .filter_map(|p| PlayerId::from_bus_name(p.bus_name()))
                .collect()),
            Err(FindingError::NoPlayerFound) => Ok(vec![]),
            Err(FindingError::DBusError(e)) => Err(SourceError::Bus(e.to_string())),
        }
    }

    fn query(&mut self, id: &PlayerId) -> Result<PlayerState, SourceError> {
        let result = self.read_state(id);
        if result.is_err() {
            self.handles.remove(id);
        }
        result
    }

    fn subscribe(&mut self, id: &PlayerId) -> Result<(), SourceError> {
        if self.watchers.contains_key(id) {
            return Ok(());
        }
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_id = id.clone();
        let events = self.events.clone();

        std::thread::Builder::new()
            .name(format!("mpris-{id}"))
            .spawn(move || pump_events(thread_id, thread_stop, events))
            .map_err(|e| SourceError::Unavailable(format!("failed to spawn watcher: {e}")))?;

        self.watchers.insert(id.clone(), stop);
        Ok(())
    }

    fn unsubscribe(&mut self, id: &PlayerId) -> Result<(), SourceError> {
        self.handles.remove(id);
        match self.watchers.remove(id) {
            Some(stop) => {
                stop.store(true, Ordering::Relaxed);
                Ok(())
            }
            None => Err(SourceError::Stale(id.clone())),
        }
    }
}

fn find_player(finder: &PlayerFinder, id: &PlayerId) -> Result<Player, SourceError> {
    let bus_name = id.bus_name();
    let players = match finder.find_all() {
        Ok(players) => players,
        Err(FindingError::NoPlayerFound) => return Err(SourceError::Stale(id.clone())),
        Err(FindingError::DBusError(e)) => return Err(SourceError::Bus(e.to_string())),
    };
    players
        .into_iter()
        .find(|p| p.bus_name() == bus_name)
        .ok_or_else(|| SourceError::Stale(id.clone()))
}

fn query_error(player: &Player, id: &PlayerId, err: mpris::DBusError) -> SourceError {
    if player.is_running() {
        SourceError::Bus(err.to_string())
    } else {
        SourceError::Stale(id.clone())
    }
}

/// Body of a per-player watcher thread.
fn pump_events(id: PlayerId, stop: Arc<AtomicBool>, events: EventSender) {
    let player = match PlayerFinder::new()
        .map_err(|e| SourceError::Bus(e.to_string()))
        .and_then(|finder| find_player(&finder, &id))
    {
        Ok(player) => player,
        Err(e) => {
            debug!(player = %id, error = %e, "player gone before watching started");
            return;
        }
    };

    let stream = match player.events() {
        Ok(stream) => stream,
        Err(e) => {
            warn!(player = %id, error = %e, "failed to listen for player events");
            return;
        }
    };

    for event in stream {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                debug!(player = %id, error = %e, "player event stream ended");
                break;
            }
        };
        if matches!(event, Event::PlayerShutDown) {
            break;
        }
        if let Some(forward) = map_event(&id, event) {
            if events.send(forward).is_err() {
                break;
            }
        }
    }
    debug!(player = %id, "stopped watching player");
}

/// Translate one MPRIS event into the aggregator's vocabulary.
///
/// Shutdown is not forwarded: vanishing is reported by the bus-name watch,
/// which cannot be confused with a later owner of the same name.
pub fn map_event(id: &PlayerId, event: Event) -> Option<PlayerEvent> {
    let status = |s| Some(PlayerEvent::StatusChanged(id.clone(), s));
    match event {
        Event::Playing => status(PlaybackStatus::Playing),
        Event::Paused => status(PlaybackStatus::Paused),
        Event::Stopped => status(PlaybackStatus::Stopped),
        Event::TrackChanged(metadata) => Some(PlayerEvent::MetadataChanged(
            id.clone(),
            track_metadata(&metadata),
        )),
        _ => None,
    }
}

pub fn map_status(status: mpris::PlaybackStatus) -> PlaybackStatus {
    match status {
        mpris::PlaybackStatus::Playing => PlaybackStatus::Playing,
        mpris::PlaybackStatus::Paused => PlaybackStatus::Paused,
        mpris::PlaybackStatus::Stopped => PlaybackStatus::Stopped,
    }
}

pub fn track_metadata(metadata: &Metadata) -> TrackMetadata {
    TrackMetadata {
        title: metadata.title().map(str::to_string),
        artist: metadata
            .artists()
            .map(|artists| artists.join(", "))
            .filter(|a| !a.is_empty()),
        album: metadata.album_name().map(str::to_string),
        // Not `track_id()`: it rejects ids that are not object paths, like `spotify:ad:...`.
        track_id: metadata
            .get("mpris:trackid")
            .and_then(MetadataValue::as_str)
            .map(str::to_string),
    }
}
