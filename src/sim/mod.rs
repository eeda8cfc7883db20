//! Game session simulation
//!
//! Sessions are pure state machines: input and elapsed time in, updated
//! entities and a list of `SessionEvent`s out. They never touch the ledger,
//! the clock, or any rendering surface.

pub mod arcade;
pub mod collision;
pub mod event;
pub mod tiles;

pub use arcade::{ArcadeInput, ArcadeSession, ArcadeSnapshot, Enemy, MotionModel, Projectile, Ship};
pub use collision::Aabb;
pub use event::{SessionEvent, SessionPhase};
pub use tiles::{Tile, TileColor, TileMatchSession, TileSnapshot, generate_grid, pairs_for_level};
