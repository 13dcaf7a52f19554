use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{PlaybackStatus, PlayerId};

/// Source of wall-clock time for activity stamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Per-player recency signal used to break ties inside a bucket.
#[derive(Debug, Default)]
pub struct ActivityTable {
    stamps: HashMap<PlayerId, DateTime<Utc>>,
}

impl ActivityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `now` as the latest activity of `id`. Stamps never move backwards,
    /// even if the wall clock does.
    pub fn touch(&mut self, id: &PlayerId, now: DateTime<Utc>) {
        let stamp = self.stamps.entry(id.clone()).or_insert(now);
        if now > *stamp {
            *stamp = now;
        }
        tracing::trace!(player = %id, at = %stamp, "activity touched");
    }

    /// Apply a status transition; touches only when the player became more active.
    /// Returns whether the stamp was refreshed.
    pub fn on_status_change(
        &mut self,
        id: &PlayerId,
        old: PlaybackStatus,
        new: PlaybackStatus,
        now: DateTime<Utc>,
    ) -> bool {
        if becomes_more_active(old, new) {
            self.touch(id, now);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: &PlayerId) -> Option<DateTime<Utc>> {
        self.stamps.get(id).copied()
    }

    pub fn remove(&mut self, id: &PlayerId) {
        self.stamps.remove(id);
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.stamps.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

/// Entering Playing always counts. Entering Paused counts only from Stopped or
/// Unknown: pausing the foreground track must not improve its recency.
pub fn becomes_more_active(old: PlaybackStatus, new: PlaybackStatus) -> bool {
    match new {
        PlaybackStatus::Playing => true,
        PlaybackStatus::Paused => {
            matches!(old, PlaybackStatus::Stopped | PlaybackStatus::Unknown)
        }
        PlaybackStatus::Stopped | PlaybackStatus::Unknown => false,
    }
}
