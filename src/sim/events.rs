//! Typed notifications drained by the view, audio and profile layers

use serde::Serialize;

use super::geometry::TileCoord;
use super::grid::{PowerupKind, TileKind};
use crate::audio::SoundEffect;

/// Fire-and-forget sound request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SoundCue {
    pub effect: SoundEffect,
    pub volume: f32,
    pub looped: bool,
}

impl SoundCue {
    pub fn new(effect: SoundEffect) -> Self {
        Self {
            effect,
            volume: 1.0,
            looped: false,
        }
    }

    pub fn with_volume(effect: SoundEffect, volume: f32) -> Self {
        Self {
            volume,
            ..Self::new(effect)
        }
    }

    /// A clip that repeats until the backend is told to stop
    pub fn looping(effect: SoundEffect, volume: f32) -> Self {
        Self {
            looped: true,
            ..Self::with_volume(effect, volume)
        }
    }
}

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    Won,
    Lost,
}

/// HUD-facing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Hud {
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub seconds_left: u32,
}

/// Something meaningful happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    Sound(SoundCue),
    HudChanged(Hud),
    Paused(bool),
    LevelStarted { level: u32 },
    AvatarHit,
    LifeLost { lives_left: u32 },
    BombPlaced { tile: TileCoord },
    BombExploded { tile: TileCoord, reach: [u32; 4] },
    BlastEnded { center: TileCoord },
    TileRevealed { tile: TileCoord, kind: TileKind },
    PowerupCollected { tile: TileCoord, kind: PowerupKind },
    EnemyDefeated { name: &'static str, points: u64 },
    EscapeStarted,
    LevelCleared { level: u32 },
    MatchFinished {
        outcome: MatchOutcome,
        score: u64,
        exp: u64,
    },
}

impl GameEvent {
    pub fn sound(effect: SoundEffect) -> Self {
        GameEvent::Sound(SoundCue::new(effect))
    }
}
