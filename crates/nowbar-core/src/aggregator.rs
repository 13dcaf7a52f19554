//! Event dispatch: every transport event updates the registry and activity
//! table, then re-runs selection and hands the result to the emitter.

use std::io::Write;

use crate::activity::{ActivityTable, Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::CoreError;
use crate::events::{PlayerEvent, PlayerSource};
use crate::models::{PlaybackStatus, PlayerId, TrackMetadata};
use crate::output::{Emitter, OutputRecord, RenderMode, Renderer};
use crate::registry::{PlayerFilter, Registry};
use crate::selector::{self, PriorityList};

/// Owns all aggregation state. Driven by one event loop, one event at a time.
pub struct Aggregator<S: PlayerSource, W: Write> {
    source: S,
    registry: Registry,
    activity: ActivityTable,
    filter: PlayerFilter,
    priority: PriorityList,
    renderer: Renderer,
    emitter: Emitter<W>,
    clock: Box<dyn Clock>,
}

impl<S: PlayerSource, W: Write> Aggregator<S, W> {
    pub fn new(source: S, out: W, config: &AppConfig, mode: RenderMode) -> Self {
        Self {
            source,
            registry: Registry::new(),
            activity: ActivityTable::new(),
            filter: config.player_filter(),
            priority: config.priority_list(),
            renderer: Renderer::new(&config.output, mode),
            emitter: Emitter::new(out),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Register every player already on the bus and emit the initial line.
    ///
    /// Failing to list players is the one fatal transport error.
    pub fn start(&mut self) -> Result<(), CoreError> {
        let names = self.source.list_player_names()?;
        tracing::info!(count = names.len(), "initializing known players");
        for id in names {
            self.register(id)?;
        }
        self.refresh()
    }

    /// Process one event. Faults other than a closed output are logged and
    /// degrade to the empty record.
    pub fn handle(&mut self, event: PlayerEvent) -> Result<(), CoreError> {
        let player = event.player().clone();
        match self.dispatch(event) {
            Ok(()) => Ok(()),
            Err(e) if e.is_output_closed() => Err(e),
            Err(e) => {
                tracing::error!(
                    player = %player,
                    error = %e,
                    "event handling failed, clearing output"
                );
                self.emitter.emit(OutputRecord::nothing()).map(|_| ())
            }
        }
    }

    /// Write the trailing blank line before exit.
    pub fn finish(&mut self) -> Result<(), CoreError> {
        self.emitter.finish()
    }

    /// Begin tracking `id`. Returns whether it is now tracked by this call.
    pub fn register(&mut self, id: PlayerId) -> Result<bool, CoreError> {
        if !self.filter.allows(&id) {
            tracing::debug!(player = %id, "player filtered out, skipping it");
            return Ok(false);
        }
        if self.registry.contains(&id) {
            tracing::debug!(player = %id, "player already tracked");
            return Ok(false);
        }
        if let Err(e) = self.source.subscribe(&id) {
            tracing::warn!(player = %id, error = %e, "failed to subscribe to player");
            return Ok(false);
        }

        tracing::info!(player = %id, "initialize new player");
        let state = self.source.query(&id).unwrap_or_else(|e| {
            tracing::debug!(player = %id, error = %e, "initial query failed");
            Default::default()
        });

        let now = self.clock.now();
        self.registry.insert(id.clone(), state.status, now);
        self.activity.touch(&id, now);

        // Synthetic metadata event so a player with existing state shows up at once.
        self.on_metadata_changed(&id, state.metadata)?;
        Ok(true)
    }

    /// Stop tracking `id`. Returns whether it was tracked.
    pub fn unregister(&mut self, id: &PlayerId) -> bool {
        self.activity.remove(id);
        if self.registry.remove(id).is_none() {
            return false;
        }
        if let Err(e) = self.source.unsubscribe(id) {
            tracing::warn!(player = %id, error = %e, "failed to unsubscribe from player");
        }
        true
    }

    fn dispatch(&mut self, event: PlayerEvent) -> Result<(), CoreError> {
        match event {
            PlayerEvent::Appeared(id) => {
                tracing::info!(player = %id, "player has appeared");
                self.register(id)?;
                Ok(())
            }
            PlayerEvent::Vanished(id) => {
                tracing::info!(player = %id, "player vanished");
                if self.unregister(&id) {
                    self.refresh()?;
                }
                Ok(())
            }
            PlayerEvent::StatusChanged(id, status) => self.on_status_changed(&id, status),
            PlayerEvent::MetadataChanged(id, metadata) => {
                self.on_metadata_changed(&id, metadata)
            }
        }
    }

    fn on_status_changed(
        &mut self,
        id: &PlayerId,
        status: PlaybackStatus,
    ) -> Result<(), CoreError> {
        let now = self.clock.now();
        let Some(old) = self.registry.record_status(id, status, now) else {
            tracing::debug!(player = %id, "status change for untracked player");
            return Ok(());
        };
        tracing::debug!(player = %id, ?old, new = ?status, "playback status changed");
        if self.activity.on_status_change(id, old, status, now) {
            tracing::debug!(player = %id, "player became more active");
        }
        self.refresh()
    }

    fn on_metadata_changed(
        &mut self,
        id: &PlayerId,
        metadata: TrackMetadata,
    ) -> Result<(), CoreError> {
        let now = self.clock.now();
        if !self.registry.mark_seen(id, now) {
            tracing::debug!(player = %id, "metadata change for untracked player");
            return Ok(());
        }
        tracing::debug!(
            player = %id,
            title = metadata.display_title().unwrap_or_default(),
            "track metadata changed"
        );
        self.activity.touch(id, now);
        self.refresh()
    }

    /// Select the most important live player and emit its record.
    fn refresh(&mut self) -> Result<(), CoreError> {
        let live = self.registry.snapshot(&mut self.source);
        let selection = selector::select(&live, &self.activity, &self.priority);
        if let Some(player) = selection {
            tracing::debug!(player = %player.id, status = ?player.state.status, "selected player");
        }
        let record = self.renderer.render(selection);
        self.emitter.emit(record)?;
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn activity(&self) -> &ActivityTable {
        &self.activity
    }

    pub fn emitter(&self) -> &Emitter<W> {
        &self.emitter
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
