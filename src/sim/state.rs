//! Game state and core simulation types
//!
//! One `GameState` is one match. It owns the avatar, the current level's
//! grids and entities, the level clock and the seeded RNG.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::avatar::Avatar;
use super::bomb::{Blast, Bomb};
use super::enemy::Enemy;
use super::events::{GameEvent, Hud, MatchOutcome, SoundCue};
use super::grid::{DamageGrid, Grid, Occupancy, OccupancyGrid, TileGrid};
use super::level::build_level;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::error::LevelError;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused; nothing advances
    Paused,
    /// Match ended
    Finished(MatchOutcome),
}

/// Tick-counted level countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelClock {
    pub duration_secs: u32,
    pub seconds_left: u32,
    sub_ticks: u32,
    /// Ticks left before the clock refills after running out
    cooldown: u32,
}

impl LevelClock {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            seconds_left: duration_secs,
            sub_ticks: 0,
            cooldown: 0,
        }
    }

    /// Advance one tick. Returns true on the tick the clock hits zero.
    pub fn advance(&mut self) -> bool {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            if self.cooldown == 0 {
                self.seconds_left = self.duration_secs;
                self.sub_ticks = 0;
            }
            return false;
        }
        self.sub_ticks += 1;
        if self.sub_ticks < TICK_RATE {
            return false;
        }
        self.sub_ticks = 0;
        self.seconds_left = self.seconds_left.saturating_sub(1);
        if self.seconds_left == 0 {
            self.cooldown = CLOCK_RESET_TICKS;
            return true;
        }
        false
    }
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    /// Layout file each level round-trips through, if any
    pub map_path: Option<PathBuf>,

    /// Current level (1-based)
    pub level: u32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,

    pub avatar: Avatar,
    /// Last HUD values published
    pub hud: Hud,
    pub clock: LevelClock,

    pub tiles: TileGrid,
    pub occupancy: OccupancyGrid,
    pub damage: DamageGrid,
    pub enemies: Vec<Enemy>,
    pub bombs: Vec<Bomb>,
    pub blasts: Vec<Blast>,

    /// Match results already reported
    pub stats_recorded: bool,
    /// Bomb key state on the previous tick
    pub(crate) bomb_latch: bool,
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    /// Start a match on level 1
    pub fn new(seed: u64, tuning: Tuning, map_path: Option<&Path>) -> Result<Self, LevelError> {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            map_path: map_path.map(Path::to_path_buf),
            level: 1,
            phase: GamePhase::Playing,
            time_ticks: 0,
            avatar: Avatar::new(),
            hud: Hud::default(),
            clock: LevelClock::new(0),
            tiles: TileGrid::from_codes(&Grid::filled(MAP_ROWS, MAP_COLS, 0))?,
            occupancy: Grid::filled(MAP_ROWS, MAP_COLS, Occupancy::Empty),
            damage: DamageGrid::new(MAP_ROWS, MAP_COLS),
            enemies: Vec::new(),
            bombs: Vec::new(),
            blasts: Vec::new(),
            stats_recorded: false,
            bomb_latch: false,
            events: Vec::new(),
        };
        state.load_level(1)?;
        Ok(state)
    }

    /// Replace the world with a freshly built level `number`
    pub fn load_level(&mut self, number: u32) -> Result<(), LevelError> {
        let tuning = self
            .tuning
            .level(number)
            .ok_or(LevelError::NoTuning(number))?;
        let level = build_level(number, tuning, &mut self.rng, self.map_path.as_deref())?;

        self.level = level.number;
        self.clock = LevelClock::new(level.timer_secs);
        self.occupancy = Grid::filled(level.tiles.rows(), level.tiles.cols(), Occupancy::Empty);
        self.damage = DamageGrid::new(level.tiles.rows(), level.tiles.cols());
        self.tiles = level.tiles;
        self.enemies = level.enemies;
        self.bombs.clear();
        self.blasts.clear();
        self.avatar.on_bomb = false;
        self.avatar.last_bomb = None;
        self.events.push(GameEvent::LevelStarted { level: number });
        self.events.push(GameEvent::Sound(SoundCue::looping(
            SoundEffect::Music,
            MUSIC_VOLUME,
        )));
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        match self.phase {
            GamePhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Current HUD values
    pub fn hud_values(&self) -> Hud {
        Hud {
            score: self.avatar.score,
            lives: self.avatar.lives,
            level: self.level,
            seconds_left: self.clock.seconds_left,
        }
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_match_starts_on_level_one() {
        let mut state = GameState::new(1, Tuning::default(), None).unwrap();
        assert_eq!(state.level, 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.clock.seconds_left, 200);
        assert_eq!(state.enemies.len(), 3);
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::LevelStarted { level: 1 },
                GameEvent::Sound(SoundCue::looping(SoundEffect::Music, MUSIC_VOLUME)),
            ]
        );
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_missing_level_tuning_is_an_error() {
        let tuning = Tuning { levels: Vec::new() };
        assert!(matches!(
            GameState::new(1, tuning, None),
            Err(LevelError::NoTuning(1))
        ));
    }

    #[test]
    fn test_clock_counts_seconds_and_refills() {
        let mut clock = LevelClock::new(2);
        let mut expired_at = None;
        for t in 1..=2 * TICK_RATE {
            if clock.advance() {
                expired_at = Some(t);
            }
        }
        assert_eq!(expired_at, Some(2 * TICK_RATE));
        assert_eq!(clock.seconds_left, 0);
        for _ in 0..CLOCK_RESET_TICKS - 1 {
            assert!(!clock.advance());
            assert_eq!(clock.seconds_left, 0);
        }
        clock.advance();
        assert_eq!(clock.seconds_left, 2);
    }
}
