//! Tile matching session
//!
//! Discrete simulation: a shuffled grid of colour pairs, two-tile selection
//! with a reveal delay before the pair is judged, and a 60 second countdown.
//! `tick` advances the reveal delay and the countdown by real elapsed time.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::event::{SessionEvent, SessionPhase};
use crate::consts::*;
use crate::rewards::ScoreEventBridge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Pink,
    Teal,
}

impl TileColor {
    /// Enough distinct colours for the largest grid
    pub const PALETTE: [TileColor; BASE_PAIRS + MAX_EXTRA_PAIRS] = [
        TileColor::Red,
        TileColor::Blue,
        TileColor::Green,
        TileColor::Yellow,
        TileColor::Purple,
        TileColor::Orange,
        TileColor::Pink,
        TileColor::Teal,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Position in the grid
    pub id: usize,
    pub color: TileColor,
    pub matched: bool,
}

/// Number of colour pairs on a level's grid
pub fn pairs_for_level(level: u32) -> usize {
    BASE_PAIRS + (level.saturating_sub(1) as usize).min(MAX_EXTRA_PAIRS)
}

/// Shuffle `pairs` distinct colours, each twice, into a fresh grid
pub fn generate_grid(pairs: usize, rng: &mut Pcg32) -> Vec<Tile> {
    let pairs = pairs.min(TileColor::PALETTE.len());
    let mut colors: Vec<TileColor> = TileColor::PALETTE[..pairs]
        .iter()
        .flat_map(|c| [*c, *c])
        .collect();
    colors.shuffle(rng);

    colors
        .into_iter()
        .enumerate()
        .map(|(id, color)| Tile {
            id,
            color,
            matched: false,
        })
        .collect()
}

/// Slack for frame times that sum to just under a whole second
const COUNTDOWN_EPSILON: f64 = 1e-4;

/// Two selected tiles waiting out the reveal delay
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingPair {
    first: usize,
    second: usize,
    is_match: bool,
    remaining: f32,
}

/// What the presentation layer draws. Colours of unrevealed tiles are hidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub phase: SessionPhase,
    pub score: u64,
    pub level: u32,
    pub time_left: u32,
    pub selected: Vec<usize>,
    /// `None` while face down
    pub faces: Vec<Option<TileColor>>,
    pub matched: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct TileMatchSession {
    pub phase: SessionPhase,
    pub score: u64,
    pub level: u32,
    pub tiles: Vec<Tile>,
    /// Currently face-up, unmatched selections (0–2)
    pub selected: Vec<usize>,
    pub time_left: u32,
    pending: Option<PendingPair>,
    /// Time accumulated toward the next countdown second
    second_accumulator: f64,
    bridge: ScoreEventBridge,
    rng: Pcg32,
}

impl TileMatchSession {
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let tiles = generate_grid(pairs_for_level(1), &mut rng);
        Self::with_parts(tiles, rng)
    }

    /// Session over a caller-built grid (tutorial layouts, tests)
    pub fn with_grid(seed: u64, tiles: Vec<Tile>) -> Self {
        Self::with_parts(tiles, Pcg32::seed_from_u64(seed))
    }

    fn with_parts(tiles: Vec<Tile>, rng: Pcg32) -> Self {
        Self {
            phase: SessionPhase::Init,
            score: 0,
            level: 1,
            tiles,
            selected: Vec::with_capacity(2),
            time_left: ROUND_SECONDS,
            pending: None,
            second_accumulator: 0.0,
            bridge: ScoreEventBridge::new(),
            rng,
        }
    }

    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Init {
            return false;
        }
        self.phase = SessionPhase::Running;
        log::info!("Tile session started ({} tiles)", self.tiles.len());
        true
    }

    /// Back to `Init` at level 1 with a fresh grid
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Init;
        self.score = 0;
        self.level = 1;
        self.bridge = ScoreEventBridge::new();
        self.load_level();
    }

    pub fn toggle_pause(&mut self) {
        self.phase = self.phase.toggled();
    }

    /// Whether a pair is face up waiting to be judged
    pub fn is_evaluating(&self) -> bool {
        self.pending.is_some()
    }

    /// Select a tile. Ignored unless running, or when the tile is matched,
    /// already selected, unknown, or two tiles are already face up.
    pub fn select(&mut self, id: usize) -> bool {
        if self.phase != SessionPhase::Running || self.selected.len() >= 2 {
            return false;
        }
        let Some(tile) = self.tiles.get(id) else {
            return false;
        };
        if tile.matched || self.selected.contains(&id) {
            return false;
        }

        self.selected.push(id);
        if let &[first, second] = self.selected.as_slice() {
            let is_match = self.tiles[first].color == self.tiles[second].color;
            let remaining = if is_match {
                MATCH_REVEAL_DELAY
            } else {
                MISMATCH_REVEAL_DELAY
            };
            self.pending = Some(PendingPair {
                first,
                second,
                is_match,
                remaining,
            });
        }
        true
    }

    pub fn snapshot(&self) -> TileSnapshot {
        TileSnapshot {
            phase: self.phase,
            score: self.score,
            level: self.level,
            time_left: self.time_left,
            selected: self.selected.clone(),
            faces: self
                .tiles
                .iter()
                .map(|t| (t.matched || self.selected.contains(&t.id)).then_some(t.color))
                .collect(),
            matched: self.tiles.iter().map(|t| t.matched).collect(),
        }
    }

    /// Advance reveal delays and the countdown by `dt` seconds
    pub fn tick(&mut self, dt: f32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Running || !(dt > 0.0) {
            return events;
        }

        if let Some(mut pending) = self.pending.take() {
            pending.remaining -= dt;
            if pending.remaining <= 0.0 {
                self.resolve(pending, &mut events);
            } else {
                self.pending = Some(pending);
            }
        }

        self.second_accumulator += f64::from(dt);
        while self.second_accumulator >= 1.0 - COUNTDOWN_EPSILON && self.time_left > 0 {
            self.second_accumulator -= 1.0;
            self.time_left -= 1;
            if self.time_left == 0 {
                self.phase = SessionPhase::GameOver;
                self.pending = None;
                log::info!("Tile game over: score {}, level {}", self.score, self.level);
                events.push(SessionEvent::GameOver {
                    final_score: self.score,
                    level: self.level,
                });
            }
        }

        events
    }

    fn resolve(&mut self, pending: PendingPair, events: &mut Vec<SessionEvent>) {
        self.selected.clear();
        let PendingPair { first, second, .. } = pending;

        if !pending.is_match {
            events.push(SessionEvent::PairMissed { first, second });
            return;
        }

        self.tiles[first].matched = true;
        self.tiles[second].matched = true;
        events.push(SessionEvent::PairMatched { first, second });
        self.add_score(MATCH_SCORE, events);

        if self.tiles.iter().all(|t| t.matched) {
            self.add_score(CLEAR_BONUS, events);
            self.level += 1;
            self.load_level();
            log::debug!("Tile level {} ({} tiles)", self.level, self.tiles.len());
            events.push(SessionEvent::LevelUp { level: self.level });
        }
    }

    fn add_score(&mut self, points: u64, events: &mut Vec<SessionEvent>) {
        self.score += points;
        events.push(SessionEvent::ScoreChanged {
            points,
            total: self.score,
        });
        if let Some(amount) = self.bridge.observe(self.score) {
            events.push(SessionEvent::GameplayReward { amount });
        }
    }

    /// New grid, cleared selection, full countdown
    fn load_level(&mut self) {
        self.tiles = generate_grid(pairs_for_level(self.level), &mut self.rng);
        self.selected.clear();
        self.pending = None;
        self.time_left = ROUND_SECONDS;
        self.second_accumulator = 0.0;
    }
}
