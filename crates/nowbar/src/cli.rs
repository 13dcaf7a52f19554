use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use nowbar_core::config::AppConfig;
use nowbar_core::output::{ButtonKind, RenderMode};

/// Print the currently most relevant media player as status-bar JSON lines.
#[derive(Debug, Parser)]
#[command(name = "nowbar", version)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Comma-separated list of players to ignore.
    #[arg(short = 'x', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Only listen to this player.
    #[arg(long)]
    pub player: Option<String>,

    /// Write diagnostics to a log file instead of stderr.
    #[arg(long)]
    pub enable_logging: bool,

    /// Log file location, used with --enable-logging.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Config file to use instead of the user config.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated preference order of players, ahead of playback status.
    #[arg(long, value_delimiter = ',')]
    pub priority: Vec<String>,

    /// Render a transport button instead of track info.
    #[arg(long, value_enum)]
    pub button: Option<Button>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Button {
    Prev,
    Next,
}

impl Cli {
    /// Overlay command-line options on the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        config.general.verbosity = config.general.verbosity.max(self.verbose);
        if self.enable_logging {
            config.general.enable_logging = true;
        }
        if let Some(path) = &self.log_file {
            config.general.log_file = path.display().to_string();
        }
        if let Some(player) = &self.player {
            config.players.selected_player = player.clone();
        }
        for name in &self.exclude {
            if !name.is_empty() && !config.players.excluded_players.contains(name) {
                config.players.excluded_players.push(name.clone());
            }
        }
        if !self.priority.is_empty() {
            config.players.priority = self.priority.clone();
        }
    }

    pub fn render_mode(&self) -> RenderMode {
        match self.button {
            None => RenderMode::Track,
            Some(Button::Prev) => RenderMode::Button(ButtonKind::Prev),
            Some(Button::Next) => RenderMode::Button(ButtonKind::Next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("nowbar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let mut config = AppConfig::default();
        parse(&[]).apply(&mut config);
        assert_eq!(config, AppConfig::default());
        assert_eq!(parse(&[]).render_mode(), RenderMode::Track);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "-vv",
            "-x",
            "firefox,chromium",
            "--player",
            "spotify",
            "--enable-logging",
            "--log-file",
            "/tmp/nowbar.log",
            "--priority",
            "spotify,mpv",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.general.verbosity, 2);
        assert!(config.general.enable_logging);
        assert_eq!(config.general.log_file, "/tmp/nowbar.log");
        assert_eq!(config.players.selected_player, "spotify");
        assert_eq!(config.players.excluded_players, vec!["firefox", "chromium"]);
        assert_eq!(config.players.priority, vec!["spotify", "mpv"]);
    }

    #[test]
    fn test_exclude_merges_with_config() {
        let mut config = AppConfig::default();
        config.players.excluded_players = vec!["firefox".into()];
        parse(&["--exclude", "firefox,vlc"]).apply(&mut config);
        assert_eq!(config.players.excluded_players, vec!["firefox", "vlc"]);
    }

    #[test]
    fn test_button_mode() {
        assert_eq!(
            parse(&["--button", "prev"]).render_mode(),
            RenderMode::Button(ButtonKind::Prev)
        );
        assert_eq!(
            parse(&["--button", "next"]).render_mode(),
            RenderMode::Button(ButtonKind::Next)
        );
        assert!(Cli::try_parse_from(["nowbar", "--button", "play"]).is_err());
    }
}
