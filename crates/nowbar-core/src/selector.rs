//! Picks the single "most important" player.
//!
//! Order: static priority list (when configured), then bucket
//! (Playing > Paused > Other), then most recent activity, then registration
//! order.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::activity::ActivityTable;
use crate::models::LivePlayer;

/// Optional fixed preference order of player names.
#[derive(Debug, Clone, Default)]
pub struct PriorityList {
    names: Vec<String>,
}

impl PriorityList {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().filter(|n| !n.is_empty()).collect(),
        }
    }

    /// Position of `player` in the list; unlisted players rank after all listed ones.
    fn rank(&self, player: &LivePlayer) -> usize {
        self.names
            .iter()
            .position(|n| n == player.id.as_str() || n == player.id.name())
            .unwrap_or(self.names.len())
    }
}

/// Select the head of the total order over `players`, or `None` when empty.
pub fn select<'a>(
    players: &'a [LivePlayer],
    activity: &ActivityTable,
    priority: &PriorityList,
) -> Option<&'a LivePlayer> {
    players.iter().min_by_key(|player| {
        let stamp = activity.get(&player.id).unwrap_or(DateTime::<Utc>::MIN_UTC);
        (
            priority.rank(player),
            player.state.status.bucket(),
            Reverse(stamp),
            player.order,
        )
    })
}
