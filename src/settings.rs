//! Player settings and preferences
//!
//! Persisted separately from the ledger under the `settings` key.

use serde::{Deserialize, Serialize};

use crate::consts::REFERENCE_FPS;
use crate::persistence::{KeyValueStore, SETTINGS_KEY, load_json, save_json};
use crate::sim::MotionModel;

/// Name recorded on high scores when the player never set one
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

/// How arcade speeds are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MotionPreset {
    /// Fixed per-frame deltas
    #[default]
    PerFrame,
    /// Frame-rate independent
    PerSecond,
}

impl MotionPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionPreset::PerFrame => "per-frame",
            MotionPreset::PerSecond => "per-second",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "per-frame" | "frame" => Some(MotionPreset::PerFrame),
            "per-second" | "second" | "fixed" => Some(MotionPreset::PerSecond),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name attached to high score entries
    pub player_name: String,
    /// Arcade speed model
    pub motion: MotionPreset,
    /// Frame rate per-frame speeds were tuned at (per-second model only)
    pub reference_fps: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            motion: MotionPreset::PerFrame,
            reference_fps: REFERENCE_FPS,
        }
    }
}

impl Settings {
    /// Motion model for new arcade sessions
    pub fn motion_model(&self) -> MotionModel {
        match self.motion {
            MotionPreset::PerFrame => MotionModel::PerFrame,
            MotionPreset::PerSecond => MotionModel::PerSecond {
                reference_fps: if self.reference_fps > 0.0 {
                    self.reference_fps
                } else {
                    REFERENCE_FPS
                },
            },
        }
    }

    /// Player name, falling back to the default for blank names
    pub fn display_name(&self) -> &str {
        let name = self.player_name.trim();
        if name.is_empty() {
            DEFAULT_PLAYER_NAME
        } else {
            name
        }
    }

    /// Load settings from the store
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Settings>(store, SETTINGS_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to the store
    pub fn save(&self, store: &dyn KeyValueStore) {
        match save_json(store, SETTINGS_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}
