//! Live session ownership and event routing
//!
//! The controller owns at most one session. Every event a session produces
//! is routed here: gameplay rewards go to the reward hub, game-over scores
//! to the leaderboard. Closing the session simply drops it.

use serde::{Deserialize, Serialize};

use crate::catalog::GameVariant;
use crate::highscores::HighScoreBook;
use crate::rewards::{RewardHub, RewardSource};
use crate::settings::Settings;
use crate::sim::{
    ArcadeInput, ArcadeSession, ArcadeSnapshot, SessionEvent, SessionPhase, TileMatchSession,
    TileSnapshot,
};

#[derive(Debug, Clone)]
pub enum ActiveSession {
    Arcade(ArcadeSession),
    Tiles(TileMatchSession),
}

impl ActiveSession {
    pub fn variant(&self) -> GameVariant {
        match self {
            ActiveSession::Arcade(_) => GameVariant::SpaceShooter,
            ActiveSession::Tiles(_) => GameVariant::PuzzleMaster,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self {
            ActiveSession::Arcade(s) => s.phase,
            ActiveSession::Tiles(s) => s.phase,
        }
    }

    pub fn score(&self) -> u64 {
        match self {
            ActiveSession::Arcade(s) => s.score,
            ActiveSession::Tiles(s) => s.score,
        }
    }
}

/// Per-frame view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum SessionSnapshot {
    SpaceShooter(ArcadeSnapshot),
    PuzzleMaster(TileSnapshot),
}

#[derive(Debug)]
pub struct SessionController {
    hub: RewardHub,
    scores: HighScoreBook,
    settings: Settings,
    active: Option<ActiveSession>,
    /// Leaderboard rank of the last committed game, if it made the board
    last_rank: Option<usize>,
}

impl SessionController {
    pub fn new(hub: RewardHub, scores: HighScoreBook, settings: Settings) -> Self {
        Self {
            hub,
            scores,
            settings,
            active: None,
            last_rank: None,
        }
    }

    pub fn hub(&self) -> &RewardHub {
        &self.hub
    }

    pub fn scores(&self) -> &HighScoreBook {
        &self.scores
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Mutable access for presentation-driven setup (tutorial layouts, tests)
    pub fn active_mut(&mut self) -> Option<&mut ActiveSession> {
        self.active.as_mut()
    }

    /// Open and start a new session, discarding any live one
    pub fn open(&mut self, variant: GameVariant, seed: u64) -> &ActiveSession {
        if let Some(previous) = self.active.take() {
            log::debug!("Discarding {} session", previous.variant().slug());
        }
        self.last_rank = None;

        let mut session = match variant {
            GameVariant::SpaceShooter => {
                ActiveSession::Arcade(ArcadeSession::new(seed, self.settings.motion_model()))
            }
            GameVariant::PuzzleMaster => ActiveSession::Tiles(TileMatchSession::new(seed)),
        };
        match &mut session {
            ActiveSession::Arcade(s) => s.start(),
            ActiveSession::Tiles(s) => s.start(),
        };
        self.active.insert(session)
    }

    /// Exit the game; nothing of the session survives
    pub fn close(&mut self) {
        self.active = None;
    }

    /// Play again: back through `Init` into a fresh run
    pub fn restart(&mut self) {
        self.last_rank = None;
        match &mut self.active {
            Some(ActiveSession::Arcade(s)) => {
                s.reset();
                s.start();
            }
            Some(ActiveSession::Tiles(s)) => {
                s.reset();
                s.start();
            }
            None => {}
        }
    }

    pub fn toggle_pause(&mut self) {
        match &mut self.active {
            Some(ActiveSession::Arcade(s)) => s.toggle_pause(),
            Some(ActiveSession::Tiles(s)) => s.toggle_pause(),
            None => {}
        }
    }

    /// One rendered frame of the arcade session
    pub fn arcade_frame(&mut self, input: &ArcadeInput, dt: f32) -> Vec<SessionEvent> {
        let events = match &mut self.active {
            Some(ActiveSession::Arcade(s)) => s.tick(input, dt),
            _ => return Vec::new(),
        };
        self.dispatch(GameVariant::SpaceShooter, &events);
        events
    }

    /// Tile click
    pub fn select_tile(&mut self, id: usize) -> bool {
        match &mut self.active {
            Some(ActiveSession::Tiles(s)) => s.select(id),
            _ => false,
        }
    }

    /// Advance the tile session's timers
    pub fn tiles_tick(&mut self, dt: f32) -> Vec<SessionEvent> {
        let events = match &mut self.active {
            Some(ActiveSession::Tiles(s)) => s.tick(dt),
            _ => return Vec::new(),
        };
        self.dispatch(GameVariant::PuzzleMaster, &events);
        events
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.active.as_ref().map(|session| match session {
            ActiveSession::Arcade(s) => SessionSnapshot::SpaceShooter(s.snapshot()),
            ActiveSession::Tiles(s) => SessionSnapshot::PuzzleMaster(s.snapshot()),
        })
    }

    fn dispatch(&mut self, variant: GameVariant, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::GameplayReward { amount } => {
                    self.hub.credit(*amount, RewardSource::Gameplay);
                }
                SessionEvent::GameOver { final_score, .. } => {
                    let name = self.settings.display_name().to_string();
                    let date = self.hub.now();
                    self.last_rank = self.scores.submit(variant, *final_score, &name, date);
                    self.hub.record_game_played();
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::PassiveAccrual;
    use crate::consts::*;
    use crate::platform::ManualClock;
    use crate::rewards::{GAMEPLAY_REWARD, RewardLedger};
    use crate::sim::Enemy;
    use chrono::{Duration, TimeZone, Utc};
    use glam::Vec2;
    use std::sync::Arc;

    const DT: f32 = 1.0 / 60.0;

    fn controller() -> (Arc<ManualClock>, SessionController) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let hub = RewardHub::new(RewardLedger::new(start), clock.clone());
        let settings = Settings {
            player_name: "Tester".to_string(),
            ..Settings::default()
        };
        (clock, SessionController::new(hub, HighScoreBook::new(), settings))
    }

    fn arcade(controller: &mut SessionController) -> &mut ArcadeSession {
        match controller.active_mut() {
            Some(ActiveSession::Arcade(s)) => s,
            _ => panic!("arcade session expected"),
        }
    }

    #[test]
    fn test_open_starts_session() {
        let (_, mut controller) = controller();
        let session = controller.open(GameVariant::PuzzleMaster, 1);
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(session.variant(), GameVariant::PuzzleMaster);

        controller.close();
        assert!(controller.active().is_none());
        assert!(controller.snapshot().is_none());
    }

    #[test]
    fn test_threshold_crossing_credits_ledger_once() {
        let (_, mut controller) = controller();
        controller.open(GameVariant::SpaceShooter, 1);

        let session = arcade(&mut controller);
        session.score = 90;
        session.enemies = vec![Enemy::new(200.0, 100.0, 0.0), Enemy::new(600.0, 50.0, 0.0)];
        session.move_ship(200.0);
        let ship_y = session.ship.pos.y;

        let fire = ArcadeInput {
            fire: true,
            ..Default::default()
        };
        // The projectile needs a few frames to reach the enemy
        for _ in 0..((ship_y / PROJECTILE_SPEED) as usize) {
            controller.arcade_frame(&fire, DT);
        }

        let ledger = controller.hub().snapshot();
        assert!((ledger.balance() - GAMEPLAY_REWARD).abs() < 1e-12);
        assert_eq!(ledger.history().count(), 1);
    }

    #[test]
    fn test_game_over_commits_score_once() {
        let (_, mut controller) = controller();
        controller.open(GameVariant::SpaceShooter, 1);
        arcade(&mut controller).score = 80;

        let mut overs = 0;
        for _ in 0..3 {
            arcade(&mut controller).enemies = vec![Enemy::new(50.0, FIELD_HEIGHT, 2.0)];
            let events = controller.arcade_frame(&ArcadeInput::default(), DT);
            overs += events
                .iter()
                .filter(|e| matches!(e, SessionEvent::GameOver { .. }))
                .count();
        }
        // Extra frames after game over change nothing
        controller.arcade_frame(&ArcadeInput::default(), DT);

        assert_eq!(overs, 1);
        let board = controller.scores().get(GameVariant::SpaceShooter);
        assert_eq!(board.scores.len(), 1);
        assert_eq!(board.scores[0].score, 80);
        assert_eq!(board.scores[0].player_name, "Tester");
        assert_eq!(controller.last_rank(), Some(1));
        assert_eq!(controller.hub().snapshot().games_played(), 1);
        assert!(controller.scores().get(GameVariant::PuzzleMaster).is_empty());
    }

    #[test]
    fn test_tile_timeout_commits_score() {
        let (_, mut controller) = controller();
        controller.open(GameVariant::PuzzleMaster, 4);
        for _ in 0..ROUND_SECONDS {
            controller.tiles_tick(1.0);
        }

        assert_eq!(controller.active().map(|s| s.phase()), Some(SessionPhase::GameOver));
        assert_eq!(controller.scores().top_n(GameVariant::PuzzleMaster, 5).len(), 1);
    }

    #[test]
    fn test_restart_after_game_over() {
        let (_, mut controller) = controller();
        controller.open(GameVariant::SpaceShooter, 1);
        arcade(&mut controller).lives = 1;
        arcade(&mut controller).enemies = vec![Enemy::new(50.0, FIELD_HEIGHT, 2.0)];
        controller.arcade_frame(&ArcadeInput::default(), DT);
        assert_eq!(controller.active().map(|s| s.phase()), Some(SessionPhase::GameOver));

        controller.restart();
        let session = arcade(&mut controller);
        assert_eq!(session.phase, SessionPhase::Running);
        assert_eq!(session.lives, INITIAL_LIVES);
        assert_eq!(session.enemies.len(), 1);
    }

    #[test]
    fn test_input_for_wrong_variant_is_ignored() {
        let (_, mut controller) = controller();
        controller.open(GameVariant::SpaceShooter, 1);
        assert!(!controller.select_tile(0));
        assert!(controller.tiles_tick(1.0).is_empty());
    }

    #[test]
    fn test_passive_accrual_continues_while_paused() {
        let (clock, mut controller) = controller();
        controller.open(GameVariant::SpaceShooter, 1);
        let mut accrual = PassiveAccrual::new(controller.hub().clone());

        controller.toggle_pause();
        clock.advance(Duration::seconds(120));
        accrual.tick();
        controller.arcade_frame(&ArcadeInput::default(), DT);

        assert_eq!(controller.active().map(|s| s.phase()), Some(SessionPhase::Paused));
        assert!((controller.hub().snapshot().balance() - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_serializes_with_variant_tag() {
        let (_, mut controller) = controller();
        controller.open(GameVariant::SpaceShooter, 1);
        arcade(&mut controller).ship.pos = Vec2::new(100.0, 550.0);

        let json = serde_json::to_value(controller.snapshot().unwrap()).unwrap();
        assert_eq!(json["variant"], "space-shooter");
        assert_eq!(json["lives"], 3);
        assert_eq!(json["ship"]["pos"][0], 100.0);
    }
}
