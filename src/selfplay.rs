//! Self-play game generation for training data.
//!
//! Plays full games with the engine on both sides, re-rooting the search tree
//! after every move. Each game is recorded as a list of steps (position, move
//! played, root visit distribution) plus the final outcome, which is copied
//! onto every step so the record can be consumed as training triples.

use std::io::Write;
use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Board, Move, Side, DEFAULT_DRAW_LIMIT};
use crate::engine::{Engine, EngineError};
use crate::eval::UniformEvaluator;
use crate::protocol::encode_position;
use crate::search::{ChildStats, GuidedPolicy, LeafPolicy, MctsConfig, RolloutPolicy};

/// Configuration for self-play game generation.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub num_games: usize,
    /// Search passes per move.
    pub passes: u32,
    /// Worker threads inside each search.
    pub search_threads: usize,
    /// Number of games played concurrently.
    pub threads: usize,
    /// Exploration constant for selection.
    pub exploration: f32,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Plies without a capture before a game is drawn.
    pub draw_limit: u16,
    /// Hard cap on game length. A capped game is recorded as a draw.
    pub max_plies: usize,
    /// Use evaluator-guided search instead of random rollouts.
    pub guided: bool,
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            passes: 300,
            search_threads: 1,
            threads: 4,
            exploration: 2.0,
            seed: 0,
            draw_limit: DEFAULT_DRAW_LIMIT,
            max_plies: 400,
            guided: false,
            quiet: false,
        }
    }
}

impl SelfPlayConfig {
    /// Search configuration used for every move.
    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig::default()
            .with_passes(self.passes)
            .with_threads(self.search_threads)
            .with_exploration(self.exploration)
    }

    fn game_seed(&self, game_id: usize) -> Option<u64> {
        (self.seed != 0).then(|| self.seed.wrapping_add(game_id as u64))
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEnd {
    /// Checkmate, king capture, or a side left without moves.
    Decisive,
    /// No capture within the draw limit.
    Draw,
    /// Stopped by `max_plies`.
    PlyCap,
}

/// One move of a recorded game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStep {
    /// Position before the move, in text notation.
    pub position: String,
    #[serde(rename = "move")]
    pub mv: Move,
    pub side: Side,
    /// Final outcome of the game from red's perspective.
    pub outcome: f32,
    /// Root statistics of the search that chose the move.
    pub visits: Vec<ChildStats>,
}

/// A complete self-play game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub steps: Vec<GameStep>,
    /// +1 red win, -1 black win, 0 draw.
    pub outcome: f32,
    pub winner: Option<Side>,
    pub end: GameEnd,
    pub plies: usize,
}

/// Plays one game with `policy` on both sides.
pub fn play_game<P: LeafPolicy>(
    config: &SelfPlayConfig,
    policy: P,
    game_id: usize,
) -> Result<GameRecord, EngineError> {
    let start = Instant::now();
    let mut engine = Engine::new(policy, config.mcts_config());
    if let Some(seed) = config.game_seed(game_id) {
        engine = engine.with_seed(seed);
    }
    engine.set_board(Board::new().with_draw_limit(config.draw_limit));

    let mut steps = Vec::new();
    while !engine.is_game_over() && steps.len() < config.max_plies {
        let position = encode_position(engine.board());
        let side = engine.board().side_to_move();
        let Some(mv) = engine.go()? else {
            break;
        };
        let visits = engine.root_stats();
        engine.play(mv)?;
        steps.push(GameStep {
            position,
            mv,
            side,
            outcome: 0.0,
            visits,
        });
    }

    let board = engine.board();
    let (outcome, end) = match board.reward() {
        Some(reward) if board.winner().is_some() => (reward, GameEnd::Decisive),
        Some(reward) => (reward, GameEnd::Draw),
        None => (0.0, GameEnd::PlyCap),
    };
    for step in &mut steps {
        step.outcome = outcome;
    }

    let record = GameRecord {
        game_id,
        plies: steps.len(),
        steps,
        outcome,
        winner: board.winner(),
        end,
    };
    if config.quiet {
        debug!(game_id, plies = record.plies, outcome, ?end, "game finished");
    } else {
        info!(
            game = game_id + 1,
            of = config.num_games,
            plies = record.plies,
            outcome,
            ?end,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "game finished"
        );
    }
    Ok(record)
}

/// Runs self-play and collects all games. Uses rollout search, or guided
/// search over a uniform evaluator when `config.guided` is set.
pub fn run_self_play(config: &SelfPlayConfig) -> Result<Vec<GameRecord>, EngineError> {
    let mut games = Vec::with_capacity(config.num_games);
    if config.guided {
        let policy = GuidedPolicy::new(UniformEvaluator::new());
        run_self_play_with_policy(config, &policy, |g| games.push(g))?;
    } else {
        run_self_play_with_policy(config, &RolloutPolicy, |g| games.push(g))?;
    }
    games.sort_by_key(|g| g.game_id);
    Ok(games)
}

/// Runs self-play with `policy`, handing each game to `on_game` as soon as it
/// finishes. Games run in parallel when `config.threads > 1`; completion
/// order is then unspecified.
pub fn run_self_play_with_policy<P, F>(
    config: &SelfPlayConfig,
    policy: &P,
    on_game: F,
) -> Result<(), EngineError>
where
    P: LeafPolicy + Clone,
    F: FnMut(GameRecord),
{
    if config.threads > 1 {
        run_self_play_parallel(config, policy, on_game)
    } else {
        run_self_play_sequential(config, policy, on_game)
    }
}

fn run_self_play_sequential<P, F>(
    config: &SelfPlayConfig,
    policy: &P,
    mut on_game: F,
) -> Result<(), EngineError>
where
    P: LeafPolicy + Clone,
    F: FnMut(GameRecord),
{
    for game_id in 0..config.num_games {
        on_game(play_game(config, policy.clone(), game_id)?);
    }
    Ok(())
}

fn run_self_play_parallel<P, F>(
    config: &SelfPlayConfig,
    policy: &P,
    mut on_game: F,
) -> Result<(), EngineError>
where
    P: LeafPolicy + Clone,
    F: FnMut(GameRecord),
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(crate::search::SearchError::from)?;
    let (tx, rx) = mpsc::channel::<GameRecord>();

    std::thread::scope(|scope| {
        let worker = scope.spawn(move || {
            pool.install(|| {
                (0..config.num_games)
                    .into_par_iter()
                    .try_for_each_with(tx, |tx, game_id| {
                        let game = play_game(config, policy.clone(), game_id)?;
                        // The receiver only hangs up once this closure is done.
                        let _ = tx.send(game);
                        Ok::<(), EngineError>(())
                    })
            })
        });

        for game in rx {
            on_game(game);
        }
        worker
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    })
}

/// Writes games as JSON lines, one game per line.
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        write_game_json(game, out)?;
    }
    out.flush()
}

/// Writes a single game as one JSON line.
pub fn write_game_json<W: Write>(game: &GameRecord, out: &mut W) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, game)?;
    writeln!(out)
}

/// Logs aggregate results over a batch of games.
pub fn print_summary(games: &[GameRecord]) {
    let total = games.len();
    let red_wins = games.iter().filter(|g| g.winner == Some(Side::Red)).count();
    let black_wins = games.iter().filter(|g| g.winner == Some(Side::Black)).count();
    let draws = games.iter().filter(|g| g.end == GameEnd::Draw).count();
    let capped = games.iter().filter(|g| g.end == GameEnd::PlyCap).count();
    let total_plies: usize = games.iter().map(|g| g.plies).sum();
    let ratio = |n: usize| (1000.0 * n as f64 / total.max(1) as f64).round() / 10.0;

    info!(
        games = total,
        avg_plies = (10.0 * total_plies as f64 / total.max(1) as f64).round() / 10.0,
        "self-play summary"
    );
    info!(
        red_wins,
        red_pct = ratio(red_wins),
        black_wins,
        black_pct = ratio(black_wins),
        draws,
        capped,
        "results"
    );
}
