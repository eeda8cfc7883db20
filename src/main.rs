//! Reward Arcade headless runner
//!
//! Loads the durable state, starts passive accrual, plays a scripted session
//! with the autopilot and prints a JSON summary of the ledger.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;

use reward_arcade::accrual::{REWARD_INTERVAL_SECS, spawn_accrual};
use reward_arcade::catalog::{self, GameVariant};
use reward_arcade::persistence::{FileStore, KeyValueStore};
use reward_arcade::platform::{Clock, SystemClock};
use reward_arcade::session::{ActiveSession, SessionController};
use reward_arcade::sim::{ArcadeInput, SessionPhase};
use reward_arcade::settings::MotionPreset;
use reward_arcade::{HighScoreBook, RewardHub, Settings};

#[derive(Parser, Debug)]
#[command(name = "reward-arcade", version, about = "Play-to-earn session and reward engine")]
struct Cli {
    /// Directory holding the durable records
    #[arg(long, default_value = ".reward-arcade")]
    data_dir: PathBuf,

    /// Game to play: space-shooter or puzzle-master
    #[arg(long, default_value = "space-shooter")]
    game: String,

    /// Simulated frames to play
    #[arg(long, default_value_t = 3600)]
    frames: u32,

    /// Frame duration in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_dt: f32,

    /// Session RNG seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,

    /// Save this player name in settings
    #[arg(long)]
    player: Option<String>,

    /// Save the arcade motion model in settings: per-frame or per-second
    #[arg(long)]
    motion: Option<String>,

    /// Register referral ids
    #[arg(long = "referral")]
    referrals: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let Some(variant) = GameVariant::from_str(&cli.game) else {
        let known: Vec<_> = catalog::playable().map(|e| e.title).collect();
        return Err(format!("unknown game '{}' (playable: {})", cli.game, known.join(", ")).into());
    };

    let file_store = FileStore::open(&cli.data_dir)?;
    log::info!("Data directory: {}", file_store.root().display());
    let store: Arc<dyn KeyValueStore> = Arc::new(file_store);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut settings = Settings::load(store.as_ref());
    let mut changed = false;
    if let Some(name) = cli.player {
        settings.player_name = name;
        changed = true;
    }
    if let Some(motion) = cli.motion {
        let Some(preset) = MotionPreset::from_str(&motion) else {
            return Err(format!("unknown motion model '{}'", motion).into());
        };
        settings.motion = preset;
        changed = true;
    }
    if changed {
        settings.save(store.as_ref());
    }
    log::info!(
        "Player {} using {} motion",
        settings.display_name(),
        settings.motion.as_str()
    );

    let hub = RewardHub::load(store.clone(), clock.clone());
    for id in &cli.referrals {
        hub.add_referral(id);
    }

    let accrual = spawn_accrual(
        hub.clone(),
        Duration::from_secs(REWARD_INTERVAL_SECS as u64),
    );

    let scores = HighScoreBook::load(store.clone());
    let mut controller = SessionController::new(hub.clone(), scores, settings);
    let seed = cli
        .seed
        .unwrap_or_else(|| clock.now().timestamp_millis() as u64);
    controller.open(variant, seed);
    log::info!("Playing {} (seed {}) for {} frames", variant.slug(), seed, cli.frames);

    for _ in 0..cli.frames {
        match variant {
            GameVariant::SpaceShooter => {
                let input = match controller.active() {
                    Some(ActiveSession::Arcade(s)) => ArcadeInput::autopilot(s),
                    _ => ArcadeInput::default(),
                };
                controller.arcade_frame(&input, cli.frame_dt);
            }
            GameVariant::PuzzleMaster => {
                if let Some(id) = next_tile_pick(&controller) {
                    controller.select_tile(id);
                }
                controller.tiles_tick(cli.frame_dt);
            }
        }

        if controller.active().map(|s| s.phase()) == Some(SessionPhase::GameOver) {
            break;
        }
    }

    let final_score = controller.active().map(|s| s.score()).unwrap_or(0);
    let finished = controller.active().map(|s| s.phase()) == Some(SessionPhase::GameOver);
    // A finished game is already on the board; an unfinished one only has a would-be rank
    let rank = if finished {
        controller.last_rank()
    } else {
        controller.scores().get(variant).potential_rank(final_score)
    };
    controller.close();
    accrual.stop();

    let ledger = hub.snapshot();
    let projected = ledger.projected_earnings();
    let top: Vec<_> = controller
        .scores()
        .top_n(variant, 5)
        .iter()
        .map(|e| json!({ "playerName": e.player_name, "score": e.score }))
        .collect();
    let summary = json!({
        "game": variant.slug(),
        "score": final_score,
        "finished": finished,
        "rank": rank,
        "balance": ledger.balance(),
        "totalEarned": ledger.total_earned(),
        "rewardRate": ledger.reward_rate(),
        "streak": ledger.streak_days(),
        "referrals": ledger.referrals().len(),
        "gamesPlayed": ledger.games_played(),
        "playTimeMinutes": ledger.play_time_minutes(),
        "projected": projected,
        "highScores": top,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Demo player for the tile game: pick the partner of a known face, else the
/// first face-down tile
fn next_tile_pick(controller: &SessionController) -> Option<usize> {
    let Some(ActiveSession::Tiles(session)) = controller.active() else {
        return None;
    };
    if session.phase != SessionPhase::Running || session.is_evaluating() {
        return None;
    }

    let mut by_color: HashMap<_, Vec<usize>> = HashMap::new();
    for tile in session.tiles.iter().filter(|t| !t.matched) {
        by_color.entry(tile.color).or_default().push(tile.id);
    }

    match session.selected.first() {
        Some(&first) => {
            let color = session.tiles[first].color;
            by_color
                .get(&color)
                .and_then(|ids| ids.iter().copied().find(|&id| id != first))
        }
        None => session.tiles.iter().find(|t| !t.matched).map(|t| t.id),
    }
}
