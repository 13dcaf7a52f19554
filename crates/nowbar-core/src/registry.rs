use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::events::PlayerSource;
use crate::models::{LivePlayer, PlaybackStatus, PlayerId};

/// Which players may be tracked at all.
#[derive(Debug, Clone, Default)]
pub struct PlayerFilter {
    selected: Option<String>,
    excluded: HashSet<String>,
}

impl PlayerFilter {
    pub fn new(selected: Option<String>, excluded: impl IntoIterator<Item = String>) -> Self {
        Self {
            selected: selected.filter(|s| !s.is_empty()),
            excluded: excluded.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// Names match either the full id or the instance-less player name.
    pub fn allows(&self, id: &PlayerId) -> bool {
        let matches = |name: &str| name == id.as_str() || name == id.name();

        if self.excluded.iter().any(|name| matches(name)) {
            return false;
        }
        match &self.selected {
            Some(selected) => matches(selected),
            None => true,
        }
    }
}

/// What the registry remembers about one tracked player.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Last status reported by an event (not by a query).
    pub last_status: PlaybackStatus,
    pub last_seen_at: DateTime<Utc>,
    pub order: u64,
}

/// Set of currently tracked players.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<PlayerId, RegistryEntry>,
    next_order: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `id`. Returns `false` if it was already tracked.
    pub fn insert(&mut self, id: PlayerId, status: PlaybackStatus, now: DateTime<Utc>) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        let order = self.next_order;
        self.next_order += 1;
        self.entries.insert(
            id,
            RegistryEntry {
                last_status: status,
                last_seen_at: now,
                order,
            },
        );
        true
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<RegistryEntry> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a status event and return the previous event-reported status.
    pub fn record_status(
        &mut self,
        id: &PlayerId,
        status: PlaybackStatus,
        now: DateTime<Utc>,
    ) -> Option<PlaybackStatus> {
        let entry = self.entries.get_mut(id)?;
        let old = entry.last_status;
        entry.last_status = status;
        entry.last_seen_at = now;
        Some(old)
    }

    /// Note that `id` reported something. Returns `false` for untracked players.
    pub fn mark_seen(&mut self, id: &PlayerId, now: DateTime<Utc>) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.last_seen_at = now;
                true
            }
            None => false,
        }
    }

    /// Query every tracked player and return the ones that answered, in
    /// registration order. Players whose query fails are left out.
    pub fn snapshot(&self, source: &mut dyn PlayerSource) -> Vec<LivePlayer> {
        let mut tracked: Vec<(&PlayerId, &RegistryEntry)> = self.entries.iter().collect();
        tracked.sort_by_key(|(_, entry)| entry.order);

        tracked
            .into_iter()
            .filter_map(|(id, entry)| match source.query(id) {
                Ok(state) => Some(LivePlayer {
                    id: id.clone(),
                    state,
                    order: entry.order,
                }),
                Err(e) => {
                    tracing::debug!(player = %id, error = %e, "player not queryable, skipping");
                    None
                }
            })
            .collect()
    }
}
