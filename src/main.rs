//! Tiletrio: stacked tile-matching puzzle in the terminal.

mod app;
mod game;
mod input;
mod leaderboard;
mod paths;
mod profile;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Largest tray the sidebar can draw.
const MAX_CAPACITY: i64 = 10;

/// Options derived from CLI that affect the session (rules, seed, player, storage).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rules: game::Rules,
    pub seed: Option<u64>,
    pub player: Option<String>,
    pub leaderboard_path: PathBuf,
    pub profile_path: PathBuf,
    pub start_mode: Option<GameMode>,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using default: {}", e);
        theme::Theme::default_for_palette(args.palette)
    });
    let config = GameConfig::from_args(&args);
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// Logs go to `log_file` when given; otherwise they are off unless `RUST_LOG` says otherwise,
/// since the terminal belongs to the UI.
fn init_logging(log_file: Option<&std::path::Path>) -> Result<()> {
    let mut builder = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let mut b =
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
            b.target(env_logger::Target::Pipe(Box::new(file)));
            b
        }
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")),
    };
    builder.init();
    Ok(())
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Self {
        let rules = game::Rules {
            max_collection: usize::from(args.capacity),
            base_score: args.base_score,
            combo_window: Duration::from_millis(args.combo_window_ms),
            low_water: args.low_water,
            ..game::Rules::default()
        };
        let leaderboard_path = match &args.leaderboard {
            Some(p) => p.clone(),
            None => paths::config_file(leaderboard::FILENAME),
        };
        Self {
            rules,
            seed: args.seed,
            player: args.name.as_deref().map(str::trim).filter(|n| !n.is_empty()).map(String::from),
            leaderboard_path,
            profile_path: paths::config_file(profile::FILENAME),
            start_mode: args.no_menu.then_some(args.mode),
            frame_rate: args.frame_rate.max(1.0),
        }
    }
}

/// Stacked tile-matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tiletrio",
    version,
    about = "Stacked tile-matching puzzle in the terminal. Pick uncovered tiles; three of a kind in the tray clear.",
    long_about = "Tiletrio is a terminal tile-matching puzzle.\n\n\
        Tiles are stacked in a pyramid. A tile can be picked only when nothing on a higher layer \
        covers it. Picked tiles go to a tray of 7 slots; three of the same kind clear and score. \
        Fill the tray without a match and the game is over.\n\n\
        MODES:\n  normal   Clear the whole pyramid to win.\n  endless  New tiles keep arriving; play until the tray overflows.\n\n\
        CONTROLS:\n  Mouse click      Pick a tile\n  Left/Right, h/l  Move cursor between pickable tiles\n  \
        Enter/Space      Pick tile under cursor\n  Esc / Q          Back / quit"
)]
pub struct Args {
    /// Game mode used with --no-menu: normal (clear the pyramid) or endless (play until overflow).
    #[arg(short, long, default_value = "normal")]
    pub mode: GameMode,

    /// Skip the main menu and start a game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Seed for tile shuffling and endless refills (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Player name; skips the name prompt. Endless scores are submitted under this name.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Tray slots (1-10); filling them without a match loses.
    #[arg(
        long,
        default_value = "7",
        value_name = "SLOTS",
        value_parser = clap::value_parser!(u16).range(1..=MAX_CAPACITY)
    )]
    pub capacity: u16,

    /// Points per match before the combo multiplier.
    #[arg(long, default_value = "100", value_name = "POINTS")]
    pub base_score: u32,

    /// A match within this many ms of the previous one raises the combo.
    #[arg(long, default_value = "2000", value_name = "MS")]
    pub combo_window_ms: u64,

    /// Endless mode refills when fewer tiles than this remain on the board.
    #[arg(long, default_value = "15", value_name = "TILES")]
    pub low_water: usize,

    /// Leaderboard JSON file. Defaults to the config directory.
    #[arg(long, value_name = "FILE")]
    pub leaderboard: Option<PathBuf>,

    /// Path to theme file (`key = #RRGGBB` lines). Uses the built-in palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameMode {
    #[default]
    Normal,
    Endless,
}

impl GameMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Endless => "Endless",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_knobs_reach_rules() {
        let args = Args::parse_from([
            "tiletrio",
            "--capacity",
            "5",
            "--combo-window-ms",
            "1500",
            "--low-water",
            "20",
            "--leaderboard",
            "/tmp/lb.json",
            "--mode",
            "endless",
            "--no-menu",
            "--name",
            "  mimi  ",
        ]);
        let config = GameConfig::from_args(&args);
        assert_eq!(config.rules.max_collection, 5);
        assert_eq!(config.rules.combo_window, Duration::from_millis(1500));
        assert_eq!(config.rules.low_water, 20);
        assert_eq!(config.rules.base_score, 100);
        assert_eq!(config.leaderboard_path, PathBuf::from("/tmp/lb.json"));
        assert_eq!(config.start_mode, Some(GameMode::Endless));
        assert_eq!(config.player.as_deref(), Some("mimi"));
    }

    #[test]
    fn capacity_outside_the_tray_range_is_rejected() {
        for bad in ["0", "11", "18446744073709551615"] {
            assert!(
                Args::try_parse_from(["tiletrio", "--capacity", bad]).is_err(),
                "capacity {bad} accepted"
            );
        }
        let args = Args::try_parse_from(["tiletrio", "--capacity", "10"]).unwrap();
        let config = GameConfig::from_args(&args);
        assert_eq!(config.rules.max_collection, 10);
        assert!(game::GameState::new(config.rules, Some(1)).is_ok());
    }

    #[test]
    fn mode_is_only_forced_with_no_menu() {
        let args = Args::parse_from(["tiletrio", "--mode", "endless"]);
        let config = GameConfig::from_args(&args);
        assert_eq!(config.start_mode, None);
        assert_eq!(config.player, None);
    }
}
