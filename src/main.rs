//! Mergetui: the sliding-tile merge puzzle (2048) in the terminal.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Options derived from CLI that affect the game session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed seed for tile placement; None draws a fresh seed from the OS.
    pub seed: Option<u64>,
    /// Fade in freshly spawned tiles.
    pub animate: bool,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            warn!(error = %e, "theme not loaded, using defaults");
            let mut theme = theme::Theme::default();
            theme.apply_palette(args.palette);
            theme
        }
    };
    let config = GameConfig {
        seed: args.seed,
        animate: !args.no_animation,
        frame_rate: args.frame_rate,
    };
    let mut app = App::new(config, theme)?;
    let summary = app.run()?;
    println!("{summary}");
    Ok(())
}

/// Log to a file so output never lands on the alternate screen. `RUST_LOG` overrides the level.
fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(anyhow::Error::msg)
        .context("installing log subscriber")
}

/// Sliding-tile merge puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "mergetui",
    version,
    about = "Sliding-tile merge puzzle (2048) in the terminal. Slide tiles, merge equal pairs, reach 2048.",
    long_about = "Mergetui is the 2048 puzzle on a 4x4 board.\n\n\
        Every move slides all tiles one way; two equal tiles that meet merge into their sum, \
        which is added to your score. After each move that changes the board a new 2 appears \
        on a random empty cell. Make a 2048 tile to win; the game is lost when the board is \
        full and no neighbours match.\n\n\
        CONTROLS:\n  Arrows / w a s d / k h j l / 8 4 5 6   Up Left Down Right\n  \
        r  New game (after win or loss)   q / Esc / Ctrl-C  Quit"
)]
pub struct Args {
    /// Seed for tile placement. The same seed and moves always replay the same game.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value", keys tile_0, tile_2 … tile_2048). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, colorblind, or ansi (terminal's 256-colour table).
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the fade-in of newly spawned tiles.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,

    #[value(alias = "256")]
    Ansi,
}
