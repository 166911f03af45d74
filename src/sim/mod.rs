//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entities are kept in spawn order)
//! - No rendering, audio or platform dependencies

pub mod avatar;
pub mod bomb;
pub mod collision;
pub mod enemy;
pub mod events;
pub mod geometry;
pub mod grid;
pub mod level;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use avatar::Avatar;
pub use bomb::{Blast, Bomb};
pub use enemy::{Enemy, EnemyKind};
pub use events::{GameEvent, Hud, MatchOutcome, SoundCue};
pub use geometry::{Body, Direction, TileCoord};
pub use grid::{DamageGrid, Occupancy, OccupancyGrid, PowerupKind, TileGrid, TileKind};
pub use snapshot::Snapshot;
pub use state::{GamePhase, GameState, LevelClock};
pub use tick::{TickInput, tick};
