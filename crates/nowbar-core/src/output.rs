//! Rendering of the selected player into a status-bar record, and the
//! de-duplicating line writer.

use std::io::Write;

use serde::Serialize;

use crate::config::OutputConfig;
use crate::error::CoreError;
use crate::models::{LivePlayer, PlaybackStatus};

/// Player whose track ids carry advertisement markers.
const AD_PLAYER: &str = "spotify";
const AD_MARKER: &str = ":ad:";
const AD_LABEL: &str = "Advertisement";

const NOTHING_CLASS: &str = "nothing";
const BUTTON_CLASS: &str = "media";

/// One JSON line for the status bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub text: String,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl OutputRecord {
    /// The canonical empty record; the bar collapses the widget on it.
    pub fn nothing() -> Self {
        Self {
            text: String::new(),
            class: NOTHING_CLASS.into(),
            alt: None,
            tooltip: None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        self.class == NOTHING_CLASS && self.text.is_empty()
    }
}

/// Transport button rendered in button mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Prev,
    Next,
}

impl ButtonKind {
    pub fn icon(self) -> &'static str {
        match self {
            ButtonKind::Prev => "\u{f04ae}",
            ButtonKind::Next => "\u{f04ad}",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Track,
    Button(ButtonKind),
}

/// Turns a selection into an [`OutputRecord`].
#[derive(Debug, Clone)]
pub struct Renderer {
    prefix: String,
    playing_icon: String,
    paused_icon: String,
    tooltip: bool,
    mode: RenderMode,
}

impl Renderer {
    pub fn new(config: &OutputConfig, mode: RenderMode) -> Self {
        Self {
            prefix: config.prefix.clone(),
            playing_icon: config.playing_icon.clone(),
            paused_icon: config.paused_icon.clone(),
            tooltip: config.tooltip,
            mode,
        }
    }

    pub fn render(&self, selection: Option<&LivePlayer>) -> OutputRecord {
        let Some(player) = selection else {
            return OutputRecord::nothing();
        };
        match self.mode {
            RenderMode::Track => self.render_track(player),
            RenderMode::Button(kind) => render_button(player, kind),
        }
    }

    fn render_track(&self, player: &LivePlayer) -> OutputRecord {
        let name = player.id.name();
        let meta = &player.state.metadata;

        let text = if is_advertisement(player) {
            AD_LABEL.to_string()
        } else {
            let artist = meta.display_artist().map(escape_markup);
            let title = meta.display_title().map(escape_markup);
            let body = match (artist, title) {
                (Some(artist), Some(title)) => format!("{artist} - {title}"),
                (Some(only), None) | (None, Some(only)) => only,
                (None, None) => return OutputRecord::nothing(),
            };
            format!("{}{body}", self.prefix_for(player.state.status))
        };

        let tooltip = self.tooltip.then(|| {
            [meta.display_title(), meta.display_artist(), meta.display_album()]
                .into_iter()
                .flatten()
                .map(escape_markup)
                .collect::<Vec<_>>()
                .join("\n")
        });

        OutputRecord {
            text,
            class: format!("custom-{name}"),
            alt: Some(name.to_string()),
            tooltip: tooltip.filter(|t| !t.is_empty()),
        }
    }

    fn prefix_for(&self, status: PlaybackStatus) -> String {
        let icon = match status {
            PlaybackStatus::Playing => &self.playing_icon,
            PlaybackStatus::Paused => &self.paused_icon,
            _ => return self.prefix.clone(),
        };
        format!("{icon}{}", self.prefix)
    }
}

fn render_button(player: &LivePlayer, kind: ButtonKind) -> OutputRecord {
    match player.state.status {
        PlaybackStatus::Playing | PlaybackStatus::Paused => OutputRecord {
            text: kind.icon().into(),
            class: BUTTON_CLASS.into(),
            alt: None,
            tooltip: None,
        },
        _ => OutputRecord::nothing(),
    }
}

fn is_advertisement(player: &LivePlayer) -> bool {
    player.id.name() == AD_PLAYER
        && player
            .state
            .metadata
            .track_id
            .as_deref()
            .is_some_and(|id| id.contains(AD_MARKER))
}

/// Escape ampersands for the bar's Pango markup.
pub fn escape_markup(s: &str) -> String {
    s.replace('&', "&amp;")
}

/// Writes records as JSON lines, skipping exact repeats of the last one.
pub struct Emitter<W: Write> {
    out: W,
    last: Option<OutputRecord>,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Write `record` unless it equals the previous one. Returns whether a
    /// line was written.
    pub fn emit(&mut self, record: OutputRecord) -> Result<bool, CoreError> {
        if self.last.as_ref() == Some(&record) {
            tracing::trace!("output unchanged, skipping");
            return Ok(false);
        }
        let line = serde_json::to_string(&record)?;
        tracing::debug!(%line, "writing output");
        self.write_line(&line)?;
        self.last = Some(record);
        Ok(true)
    }

    /// Write the trailing blank line so the bar drops the stale record.
    pub fn finish(&mut self) -> Result<(), CoreError> {
        self.last = None;
        self.write_line("")
    }

    pub fn last(&self) -> Option<&OutputRecord> {
        self.last.as_ref()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn write_line(&mut self, line: &str) -> Result<(), CoreError> {
        writeln!(self.out, "{line}").map_err(CoreError::Output)?;
        self.out.flush().map_err(CoreError::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlayerId, PlayerState, TrackMetadata};

    fn renderer() -> Renderer {
        Renderer::new(&OutputConfig::default(), RenderMode::Track)
    }

    fn live(name: &str, status: PlaybackStatus, meta: TrackMetadata) -> LivePlayer {
        LivePlayer {
            id: PlayerId::new(name),
            state: PlayerState {
                status,
                metadata: meta,
            },
            order: 0,
        }
    }

    fn track(artist: Option<&str>, title: Option<&str>) -> TrackMetadata {
        TrackMetadata {
            artist: artist.map(String::from),
            title: title.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_selection_is_nothing() {
        let record = renderer().render(None);
        assert_eq!(record, OutputRecord::nothing());
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"text":"","class":"nothing"}"#
        );
    }

    #[test]
    fn test_artist_and_title_with_escaping() {
        let p = live(
            "mpv",
            PlaybackStatus::Playing,
            track(Some("AC & DC"), Some("Rock & Roll")),
        );
        let record = renderer().render(Some(&p));
        assert_eq!(record.text, " AC &amp; DC - Rock &amp; Roll");
        assert_eq!(record.class, "custom-mpv");
        assert_eq!(record.alt.as_deref(), Some("mpv"));
    }

    #[test]
    fn test_single_field_is_used_alone() {
        let only_title = live("vlc", PlaybackStatus::Paused, track(None, Some("Intro")));
        assert_eq!(renderer().render(Some(&only_title)).text, " Intro");

        let only_artist = live("vlc", PlaybackStatus::Paused, track(Some("Björk"), Some("  ")));
        assert_eq!(renderer().render(Some(&only_artist)).text, " Björk");
    }

    #[test]
    fn test_missing_metadata_is_nothing() {
        let p = live("vlc", PlaybackStatus::Playing, track(None, Some("")));
        assert!(renderer().render(Some(&p)).is_nothing());
    }

    #[test]
    fn test_advertisement_override() {
        let mut meta = track(Some("Brand"), Some("Buy now"));
        meta.track_id = Some("spotify:ad:000000012c3f9a27".into());
        let p = live("spotify", PlaybackStatus::Playing, meta.clone());
        let record = renderer().render(Some(&p));
        assert_eq!(record.text, "Advertisement");
        assert_eq!(record.class, "custom-spotify");

        let other = live("mpv", PlaybackStatus::Playing, meta);
        assert_eq!(renderer().render(Some(&other)).text, " Brand - Buy now");
    }

    #[test]
    fn test_advertisement_without_any_metadata() {
        let meta = TrackMetadata {
            track_id: Some("/com/spotify/ad/1".into()),
            ..Default::default()
        };
        let p = live("spotify", PlaybackStatus::Playing, meta.clone());
        assert!(renderer().render(Some(&p)).is_nothing());

        let meta = TrackMetadata {
            track_id: Some("spotify:ad:1".into()),
            ..Default::default()
        };
        let p = live("spotify", PlaybackStatus::Playing, meta);
        assert_eq!(renderer().render(Some(&p)).text, "Advertisement");
    }

    #[test]
    fn test_status_icons_and_class_use_instance_free_name() {
        let config = OutputConfig {
            playing_icon: "\u{f144}".into(),
            paused_icon: "\u{f28b}".into(),
            ..OutputConfig::default()
        };
        let r = Renderer::new(&config, RenderMode::Track);
        let playing = live(
            "firefox.instance_1_7",
            PlaybackStatus::Playing,
            track(None, Some("Song")),
        );
        let record = r.render(Some(&playing));
        assert_eq!(record.text, "\u{f144} Song");
        assert_eq!(record.class, "custom-firefox");
        assert_eq!(record.alt.as_deref(), Some("firefox"));

        let paused = live("mpv", PlaybackStatus::Paused, track(None, Some("Song")));
        assert_eq!(r.render(Some(&paused)).text, "\u{f28b} Song");

        let stopped = live("mpv", PlaybackStatus::Stopped, track(None, Some("Song")));
        assert_eq!(r.render(Some(&stopped)).text, " Song");
    }

    #[test]
    fn test_tooltip() {
        let config = OutputConfig {
            tooltip: true,
            ..OutputConfig::default()
        };
        let mut meta = track(Some("Simon & Garfunkel"), Some("Mrs. Robinson"));
        meta.album = Some("Bookends".into());
        let p = live("mpv", PlaybackStatus::Playing, meta);
        let record = Renderer::new(&config, RenderMode::Track).render(Some(&p));
        assert_eq!(
            record.tooltip.as_deref(),
            Some("Mrs. Robinson\nSimon &amp; Garfunkel\nBookends")
        );
        assert!(renderer().render(Some(&p)).tooltip.is_none());
    }

    #[test]
    fn test_button_mode() {
        let r = Renderer::new(&OutputConfig::default(), RenderMode::Button(ButtonKind::Next));
        let paused = live("mpv", PlaybackStatus::Paused, TrackMetadata::default());
        let record = r.render(Some(&paused));
        assert_eq!(record.text, "\u{f04ad}");
        assert_eq!(record.class, "media");
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            "{\"text\":\"\u{f04ad}\",\"class\":\"media\"}"
        );

        let stopped = live("mpv", PlaybackStatus::Stopped, TrackMetadata::default());
        assert!(r.render(Some(&stopped)).is_nothing());
        assert!(r.render(None).is_nothing());
    }

    #[test]
    fn test_emitter_deduplicates() {
        let mut emitter = Emitter::new(Vec::new());
        let record = OutputRecord {
            text: " Song".into(),
            class: "custom-mpv".into(),
            alt: Some("mpv".into()),
            tooltip: None,
        };
        assert!(emitter.emit(record.clone()).unwrap());
        assert!(!emitter.emit(record.clone()).unwrap());
        assert!(emitter.emit(OutputRecord::nothing()).unwrap());
        assert!(emitter.emit(record).unwrap());

        let written = String::from_utf8(emitter.get_ref().clone()).unwrap();
        assert_eq!(written.lines().count(), 3);
    }

    #[test]
    fn test_emitter_writes_unescaped_utf8() {
        let mut emitter = Emitter::new(Vec::new());
        emitter
            .emit(OutputRecord {
                text: " Sigur Rós".into(),
                class: "custom-mpv".into(),
                alt: Some("mpv".into()),
                tooltip: None,
            })
            .unwrap();
        let written = String::from_utf8(emitter.get_ref().clone()).unwrap();
        assert_eq!(
            written,
            "{\"text\":\" Sigur Rós\",\"class\":\"custom-mpv\",\"alt\":\"mpv\"}\n"
        );
    }

    #[test]
    fn test_finish_writes_blank_line() {
        let mut emitter = Emitter::new(Vec::new());
        emitter.emit(OutputRecord::nothing()).unwrap();
        emitter.finish().unwrap();
        let written = String::from_utf8(emitter.get_ref().clone()).unwrap();
        assert!(written.ends_with("}\n\n"));
        assert!(emitter.last().is_none());
    }

    #[test]
    fn test_broken_pipe_is_reported() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut emitter = Emitter::new(Closed);
        let err = emitter.emit(OutputRecord::nothing()).unwrap_err();
        assert!(err.is_output_closed());
        assert!(emitter.last().is_none());
    }
}
