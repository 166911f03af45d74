//! Bomb Arena - A tile-based arena bomb game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, collision, entities, bombs, orchestrator)
//! - `runner`: Fixed-timestep loop and match thread lifecycle
//! - `audio`: Fire-and-forget sound cue dispatch
//! - `profile`: Player statistics persistence
//! - `settings`: Player preferences
//! - `tuning`: Data-driven level balance

pub mod audio;
pub mod error;
pub mod profile;
pub mod runner;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{LevelError, ProfileError, StartError};
pub use profile::{PlayerProfile, ProfileStore};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Simulation rate
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator; exactly `MAX_SUBSTEPS` ticks
    pub const MAX_FRAME_DT: f32 = MAX_SUBSTEPS as f32 * SIM_DT;

    /// Tile edge in pixels
    pub const TILE_SIZE: i32 = 64;
    /// Level grid dimensions
    pub const MAP_ROWS: usize = 15;
    pub const MAP_COLS: usize = 17;

    /// Avatar defaults
    pub const AVATAR_SPAWN_X: i32 = 128;
    pub const AVATAR_SPAWN_Y: i32 = 128;
    pub const AVATAR_LIVES: u32 = 4;
    pub const AVATAR_SPEED: i32 = 4;
    pub const AVATAR_RADIUS: u32 = 1;
    pub const AVATAR_MAX_BOMBS: u32 = 1;
    /// Invincibility window (7 s)
    pub const AVATAR_INVINCIBLE_TICKS: u32 = 7 * TICK_RATE;
    /// Score lost when the avatar is hit
    pub const HIT_PENALTY: u64 = 100;
    pub const DEATH_FRAMES: u32 = 8;
    pub const ESCAPE_FRAMES: u32 = 10;

    /// Enemy defaults
    pub const ENEMY_SPEED: i32 = 2;
    pub const ENEMY_DEATH_FRAMES: u32 = 3;
    /// Flyer invincibility after a hit (4 s)
    pub const FLYER_INVINCIBLE_TICKS: u32 = 4 * TICK_RATE;
    /// A turn fires when a roll in `0..TURN_ROLL` is at most `TURN_THRESHOLD`
    pub const TURN_ROLL: u32 = 300;
    pub const TURN_THRESHOLD: u32 = 1;

    /// Animation cadence (ticks per frame)
    pub const DEATH_FRAME_TICKS: u32 = 15;
    pub const WALK_FRAME_TICKS: u32 = 10;
    pub const BOMB_FRAME_TICKS: u32 = 20;
    pub const BLAST_FRAME_TICKS: u32 = 6;
    pub const CRUMBLE_FRAME_TICKS: u32 = 10;

    /// Bomb fuse length
    pub const FUSE_TICKS: u32 = 130;
    /// Blast damage window
    pub const BLAST_TICKS: u32 = 53;
    /// Hit destructible walls convert after this many crumble phases
    pub const CRUMBLE_PHASES: u32 = 5;

    /// Held ticks between footstep cues
    pub const STEP_CUE_TICKS: u32 = 40;
    /// Level clock cooldown after it runs out (2.5 s)
    pub const CLOCK_RESET_TICKS: u32 = 150;

    /// Level clear bonuses
    pub const CLEAR_BONUS_LIVES: u32 = 2;
    pub const CLEAR_BONUS_SCORE: u64 = 1000;

    /// Background track gain
    pub const MUSIC_VOLUME: f32 = 0.7;
}
