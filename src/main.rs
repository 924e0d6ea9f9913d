use anyhow::{Context, Result};
use chess_core::engine::config::EngineConfig;
use chess_core::logic::board::{Color, Position};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

mod app;

use app::App;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Self::White,
            Side::Black => Self::Black,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chess_ai")]
#[command(about = "Play chess against an alpha-beta engine in the terminal")]
struct Args {
    /// Search depth in plies, clamped to 1..=8 (default: from config, 3)
    #[arg(short, long)]
    depth: Option<u8>,

    /// Side played by the engine
    #[arg(short, long, value_enum, default_value_t = Side::Black)]
    engine_color: Side,

    /// JSON tuning file; weights are multipliers of the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start from this FEN instead of the initial position
    #[arg(short, long)]
    fen: Option<String>,

    /// Pause before the engine replies, in milliseconds (default: from config, 500)
    #[arg(long)]
    delay_ms: Option<u64>,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::load_from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(delay) = args.delay_ms {
        config.reply_delay_ms = delay;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let start = match &args.fen {
        Some(fen) => Position::from_fen(fen).with_context(|| format!("invalid FEN `{fen}`"))?,
        None => Position::start(),
    };
    let depth = args.depth.unwrap_or(config.default_depth);
    info!(
        "engine plays {:?} at depth {depth}, reply delay {} ms",
        args.engine_color, config.reply_delay_ms
    );

    let mut app = App::new(config, start, args.engine_color.into(), depth);
    let stdin = std::io::stdin();
    app.run(stdin.lock(), std::io::stdout())
}
