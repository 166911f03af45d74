//! Sound cue dispatch
//!
//! The simulation only ever emits cues. `AudioManager` applies the player's
//! volume settings and hands each cue to a backend; playback never blocks the
//! tick.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::events::SoundCue;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Avatar footstep while walking
    Step,
    /// Bomb dropped
    PlaceBomb,
    /// Bomb fuse ran out
    Explosion,
    /// Avatar knocked out
    AvatarDies,
    /// Enemy killed
    EnemyDies,
    /// Destructible wall starts crumbling
    WallCrumble,
    /// Powerup collected
    ItemGet,
    /// Avatar reached the escape
    StageClear,
    /// Campaign won
    Victory,
    /// Out of lives
    Defeat,
    /// In-level background track
    Music,
}

impl SoundEffect {
    /// Clip name a file-based backend would load
    pub fn clip(&self) -> &'static str {
        match self {
            SoundEffect::Step => "step.wav",
            SoundEffect::PlaceBomb => "bomb.wav",
            SoundEffect::Explosion => "explodes.wav",
            SoundEffect::AvatarDies => "avatar_dies.wav",
            SoundEffect::EnemyDies => "enemy_dies.wav",
            SoundEffect::WallCrumble => "crumble.wav",
            SoundEffect::ItemGet => "get.wav",
            SoundEffect::StageClear => "clear.wav",
            SoundEffect::Victory => "victory.wav",
            SoundEffect::Defeat => "defeat.wav",
            SoundEffect::Music => "game.wav",
        }
    }
}

/// Something that can start a clip at a given gain
pub trait AudioBackend: Send {
    fn start(&mut self, effect: SoundEffect, gain: f32, looped: bool);

    /// Silence every looping clip
    fn stop_loops(&mut self) {}
}

/// Backend for headless runs: every cue becomes a debug log line
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn start(&mut self, effect: SoundEffect, gain: f32, looped: bool) {
        log::debug!(
            "Sound {:?} ({}) gain {:.2}{}",
            effect,
            effect.clip(),
            gain,
            if looped { " looped" } else { "" }
        );
    }

    fn stop_loops(&mut self) {
        log::debug!("Looping clips stopped");
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(LogBackend))
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Build with the volume preferences from `settings`
    pub fn from_settings(settings: &Settings, backend: Box<dyn AudioBackend>) -> Self {
        let mut audio = Self::new(backend);
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);
        audio
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a cue; silent cues are dropped before reaching the backend
    pub fn play(&mut self, cue: SoundCue) {
        let gain = self.effective_volume() * cue.volume.clamp(0.0, 1.0);
        if gain <= 0.0 {
            return;
        }
        self.backend.start(cue.effect, gain, cue.looped);
    }

    pub fn stop_loops(&mut self) {
        self.backend.stop_loops();
    }
}
