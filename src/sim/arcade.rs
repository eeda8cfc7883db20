//! Arcade shooter session
//!
//! Continuous simulation on an 800×600 field: the player's ship follows the
//! pointer along the bottom, projectiles fly up, waves of enemies descend.
//! One `tick` per rendered frame.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::event::{SessionEvent, SessionPhase};
use crate::consts::*;
use crate::rewards::ScoreEventBridge;

/// How entity speeds relate to elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum MotionModel {
    /// Fixed deltas per tick whatever `dt` is; difficulty follows frame rate
    #[default]
    PerFrame,
    /// Deltas scaled by `dt * reference_fps`; same speed at any frame rate
    PerSecond { reference_fps: f32 },
}

impl MotionModel {
    /// Multiplier applied to per-frame deltas for a tick of `dt` seconds
    pub fn scale(&self, dt: f32) -> f32 {
        match self {
            MotionModel::PerFrame => 1.0,
            MotionModel::PerSecond { reference_fps } => dt.max(0.0) * reference_fps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
}

impl Ship {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(SHIP_SIZE))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    /// Downward distance per frame
    pub speed: f32,
    pub size: Vec2,
}

impl Enemy {
    pub fn new(x: f32, y: f32, speed: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            speed,
            size: Vec2::splat(ENEMY_SIZE),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// Input gathered by the presentation layer for a single frame
#[derive(Debug, Clone, Default)]
pub struct ArcadeInput {
    /// Pointer x in field coordinates
    pub pointer_x: Option<f32>,
    /// Click/tap
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
}

impl ArcadeInput {
    /// Demo input: chase the lowest enemy and fire when lined up
    pub fn autopilot(session: &ArcadeSession) -> Self {
        let target = session
            .enemies
            .iter()
            .max_by(|a, b| {
                a.pos
                    .y
                    .partial_cmp(&b.pos.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.pos.x);

        let Some(x) = target else {
            return Self::default();
        };

        let lined_up = (session.ship.pos.x - x).abs() <= ENEMY_SIZE / 2.0;
        Self {
            pointer_x: Some(x),
            fire: lined_up && session.frames.is_multiple_of(6),
            pause: false,
        }
    }
}

/// What the presentation layer draws each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcadeSnapshot {
    pub phase: SessionPhase,
    pub score: u64,
    pub level: u32,
    pub lives: u8,
    pub ship: Ship,
    pub projectiles: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
}

#[derive(Debug, Clone)]
pub struct ArcadeSession {
    pub phase: SessionPhase,
    pub score: u64,
    /// Current wave (1-based)
    pub level: u32,
    pub lives: u8,
    pub ship: Ship,
    pub projectiles: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
    pub motion: MotionModel,
    /// Frames simulated while running
    pub frames: u64,
    bridge: ScoreEventBridge,
    rng: Pcg32,
}

impl ArcadeSession {
    pub fn new(seed: u64, motion: MotionModel) -> Self {
        Self {
            phase: SessionPhase::Init,
            score: 0,
            level: 1,
            lives: INITIAL_LIVES,
            ship: Ship {
                pos: Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT - SHIP_BOTTOM_OFFSET),
            },
            projectiles: Vec::new(),
            enemies: Vec::new(),
            motion,
            frames: 0,
            bridge: ScoreEventBridge::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// `Init → Running`, spawning the first wave
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Init {
            return false;
        }
        self.enemies = self.generate_wave(self.level);
        self.phase = SessionPhase::Running;
        log::info!("Arcade session started");
        true
    }

    /// Back to `Init` for another run; the ship keeps its horizontal position
    pub fn reset(&mut self) {
        let ship_x = self.ship.pos.x;
        self.phase = SessionPhase::Init;
        self.score = 0;
        self.level = 1;
        self.lives = INITIAL_LIVES;
        self.ship.pos = Vec2::new(ship_x, FIELD_HEIGHT - SHIP_BOTTOM_OFFSET);
        self.projectiles.clear();
        self.enemies.clear();
        self.frames = 0;
        self.bridge = ScoreEventBridge::new();
    }

    pub fn toggle_pause(&mut self) {
        self.phase = self.phase.toggled();
    }

    /// Track the pointer; live in every phase except `GameOver`
    pub fn move_ship(&mut self, x: f32) {
        if self.phase == SessionPhase::GameOver {
            return;
        }
        let half = SHIP_SIZE / 2.0;
        self.ship.pos.x = x.clamp(half, FIELD_WIDTH - half);
    }

    /// Launch a projectile from the ship's nose; only while running
    pub fn fire(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.projectiles.push(Projectile {
            pos: Vec2::new(self.ship.pos.x, self.ship.pos.y - SHIP_SIZE / 2.0),
        });
    }

    pub fn snapshot(&self) -> ArcadeSnapshot {
        ArcadeSnapshot {
            phase: self.phase,
            score: self.score,
            level: self.level,
            lives: self.lives,
            ship: self.ship,
            projectiles: self.projectiles.clone(),
            enemies: self.enemies.clone(),
        }
    }

    /// Apply one frame of input and advance the simulation by `dt` seconds
    pub fn tick(&mut self, input: &ArcadeInput, dt: f32) -> Vec<SessionEvent> {
        if input.pause {
            self.toggle_pause();
        }
        if let Some(x) = input.pointer_x {
            self.move_ship(x);
        }
        if self.phase != SessionPhase::Running {
            return Vec::new();
        }
        if input.fire {
            self.fire();
        }
        self.step(dt)
    }

    /// Advance entities by one frame. No-op unless running.
    pub fn step(&mut self, dt: f32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Running {
            return events;
        }
        self.frames += 1;
        let scale = self.motion.scale(dt);

        for projectile in &mut self.projectiles {
            projectile.pos.y -= PROJECTILE_SPEED * scale;
        }
        self.projectiles.retain(|p| p.pos.y > 0.0);

        let ship_bounds = self.ship.bounds();
        let mut destroyed = 0u64;
        let mut out_of_lives = false;
        let mut survivors = Vec::with_capacity(self.enemies.len());

        for mut enemy in std::mem::take(&mut self.enemies) {
            enemy.pos.y += enemy.speed * scale;
            let bounds = enemy.bounds();

            // Projectiles first; each one destroys at most one enemy
            if let Some(i) = self
                .projectiles
                .iter()
                .position(|p| bounds.contains_point(p.pos))
            {
                self.projectiles.remove(i);
                destroyed += 1;
                continue;
            }

            if bounds.overlaps(&ship_bounds) || enemy.pos.y > FIELD_HEIGHT {
                self.lives = self.lives.saturating_sub(1);
                events.push(SessionEvent::LifeLost {
                    remaining: self.lives,
                });
                if self.lives == 0 {
                    out_of_lives = true;
                }
                continue;
            }

            survivors.push(enemy);
        }
        self.enemies = survivors;

        if destroyed > 0 {
            self.add_score(destroyed * POINTS_PER_ENEMY, &mut events);
        }

        if out_of_lives {
            self.phase = SessionPhase::GameOver;
            log::info!("Arcade game over: score {}, level {}", self.score, self.level);
            events.push(SessionEvent::GameOver {
                final_score: self.score,
                level: self.level,
            });
            return events;
        }

        if self.enemies.is_empty() {
            self.level += 1;
            self.enemies = self.generate_wave(self.level);
            log::debug!("Arcade wave {} ({} enemies)", self.level, self.enemies.len());
            events.push(SessionEvent::LevelUp { level: self.level });
        }

        events
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

    /// Spawn a wave above the top edge at random horizontal positions
    pub fn generate_wave(&mut self, level: u32) -> Vec<Enemy> {
        let (count, speed) = wave_shape(level);
        (0..count)
            .map(|_| {
                let x = self.rng.random_range(0.0..FIELD_WIDTH - ENEMY_SIZE);
                Enemy::new(x, -ENEMY_SIZE, speed)
            })
            .collect()
    }
}

/// Enemy count and per-frame speed for a level
pub fn wave_shape(level: u32) -> (u32, f32) {
    let steps = level.saturating_sub(1);
    let count = (1 + steps).min(MAX_WAVE_SIZE);
    let speed = ENEMY_BASE_SPEED + steps as f32 * ENEMY_SPEED_INCREMENT;
    (count, speed)
}
