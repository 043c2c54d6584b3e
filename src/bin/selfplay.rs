//! Self-play game generation CLI.
//!
//! Plays Xiangqi games with the engine on both sides and writes the records
//! as JSONL.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- --games 20 --passes 400 --output games.jsonl

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::info;

use xiangqi_engine::board::DEFAULT_DRAW_LIMIT;
use xiangqi_engine::eval::OnnxEvaluator;
use xiangqi_engine::search::GuidedPolicy;
use xiangqi_engine::selfplay::{self, GameRecord, SelfPlayConfig};

#[derive(Debug, Parser)]
#[command(name = "selfplay", about = "Generate Xiangqi self-play games as JSONL")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Search passes per move
    #[arg(long, default_value_t = 300)]
    passes: u32,

    /// Worker threads inside each search
    #[arg(long, default_value_t = 1)]
    search_threads: usize,

    /// Number of games played concurrently
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Exploration constant
    #[arg(long, default_value_t = 2.0)]
    exploration: f32,

    /// Random seed, 0 for entropy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Plies without a capture before a draw
    #[arg(long, default_value_t = DEFAULT_DRAW_LIMIT)]
    draw_limit: u16,

    /// Maximum plies per game; longer games are recorded as draws
    #[arg(long, default_value_t = 400)]
    max_plies: usize,

    /// Evaluator-guided search (uniform priors unless --model is given)
    #[arg(long)]
    guided: bool,

    /// ONNX model for guided search (requires the `neural` feature)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Suppress per-game progress and the summary
    #[arg(long, short)]
    quiet: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> SelfPlayConfig {
        SelfPlayConfig {
            num_games: self.games,
            passes: self.passes,
            search_threads: self.search_threads,
            threads: self.threads,
            exploration: self.exploration,
            seed: self.seed,
            draw_limit: self.draw_limit,
            max_plies: self.max_plies,
            guided: self.guided || self.model.is_some(),
            quiet: self.quiet,
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = args.config();
    info!(
        games = config.num_games,
        passes = config.passes,
        threads = config.threads,
        guided = config.guided,
        "starting self-play"
    );

    let start = Instant::now();
    let games = match &args.model {
        Some(path) => {
            let evaluator = OnnxEvaluator::load(&path.to_string_lossy(), config.search_threads)?;
            let policy = GuidedPolicy::new(Arc::new(evaluator));
            let mut games: Vec<GameRecord> = Vec::with_capacity(config.num_games);
            selfplay::run_self_play_with_policy(&config, &policy, |g| games.push(g))?;
            games.sort_by_key(|g| g.game_id);
            games
        }
        None => selfplay::run_self_play(&config)?,
    };
    let elapsed = start.elapsed();

    if !args.quiet {
        info!(
            games = games.len(),
            secs = elapsed.as_secs_f64(),
            games_per_hour = games.len() as f64 / elapsed.as_secs_f64().max(1e-9) * 3600.0,
            "self-play complete"
        );
        selfplay::print_summary(&games);
    }

    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            selfplay::write_jsonl(&games, &mut writer)?;
            info!(games = games.len(), path = %path.display(), "wrote games");
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            selfplay::write_jsonl(&games, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
