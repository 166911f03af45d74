//! Player avatar state machine

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::collision::{check_blocked, slide_offset};
use super::events::{GameEvent, SoundCue};
use super::geometry::{Body, Direction, Hitbox, TileCoord};
use super::grid::{Occupancy, OccupancyGrid, PowerupKind, TileGrid};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Volume of the footstep cue
const STEP_VOLUME: f32 = 0.85;
/// Step counter value after the direction keys are released
const STEP_COUNTER_IDLE: u32 = 20;
/// Pixels between the escape tile origin and the avatar position
const ESCAPE_SNAP_Y: i32 = 48;

/// Hitbox for a facing direction
pub fn hitbox_for(direction: Direction) -> Hitbox {
    match direction {
        Direction::Up | Direction::Down => Hitbox::new(0, 62, 60, 32),
        Direction::Left => Hitbox::new(0, 62, 48, 32),
        Direction::Right => Hitbox::new(16, 62, 45, 32),
    }
}

/// The player-controlled character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    pub pos: IVec2,
    pub direction: Direction,
    pub hitbox: Hitbox,
    pub speed: i32,
    pub lives: u32,
    pub score: u64,
    /// Experience earned this match
    pub exp: u64,
    /// Blast radius of placed bombs
    pub radius: u32,
    pub max_bombs: u32,
    /// Last movement attempt ran into something
    pub blocked: bool,

    pub invincible: bool,
    invincible_ticks: u32,
    /// Toggles every tick while invincible
    pub blink: bool,

    /// Hit-stunned, playing the death sequence
    pub hit: bool,
    penalty_applied: bool,
    death_cue_played: bool,
    pub death_frame: u32,
    death_counter: u32,

    pub escaping: bool,
    pub victorious: bool,
    pub escape_frame: u32,
    escape_counter: u32,

    /// Standing on the bomb just placed
    pub on_bomb: bool,
    /// Tile of the most recently placed bomb
    pub last_bomb: Option<TileCoord>,

    pub walk_frame: u32,
    walk_counter: u32,
    step_counter: u32,
}

impl Default for Avatar {
    fn default() -> Self {
        Self::new()
    }
}

impl Avatar {
    pub fn new() -> Self {
        let mut avatar = Self {
            pos: IVec2::new(AVATAR_SPAWN_X, AVATAR_SPAWN_Y),
            direction: Direction::Down,
            hitbox: hitbox_for(Direction::Down),
            speed: AVATAR_SPEED,
            lives: AVATAR_LIVES,
            score: 0,
            exp: 0,
            radius: AVATAR_RADIUS,
            max_bombs: AVATAR_MAX_BOMBS,
            blocked: false,
            invincible: false,
            invincible_ticks: 0,
            blink: false,
            hit: false,
            penalty_applied: false,
            death_cue_played: false,
            death_frame: 0,
            death_counter: 0,
            escaping: false,
            victorious: false,
            escape_frame: 0,
            escape_counter: 0,
            on_bomb: false,
            last_bomb: None,
            walk_frame: 1,
            walk_counter: 0,
            step_counter: STEP_COUNTER_IDLE,
        };
        avatar.make_invincible();
        avatar
    }

    pub fn make_invincible(&mut self) {
        self.invincible = true;
        self.invincible_ticks = AVATAR_INVINCIBLE_TICKS;
    }

    pub fn invincible_ticks(&self) -> u32 {
        self.invincible_ticks
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.hitbox = hitbox_for(direction);
    }

    /// Back to the spawn point; a death also costs one speed level above base
    fn respawn(&mut self) {
        self.pos = IVec2::new(AVATAR_SPAWN_X, AVATAR_SPAWN_Y);
        if self.hit && self.speed > AVATAR_SPEED {
            self.speed -= 1;
        }
        self.set_direction(Direction::Down);
        self.hit = false;
        self.death_frame = 0;
        self.make_invincible();
    }

    /// Knock the avatar out; no-op if already down
    pub fn strike(&mut self, events: &mut Vec<GameEvent>) {
        if !self.hit {
            self.hit = true;
            events.push(GameEvent::AvatarHit);
        }
    }

    /// Snap onto an escape tile and start the exit sequence
    pub fn begin_escape(&mut self, tile: TileCoord) {
        let origin = tile.origin();
        self.pos = IVec2::new(origin.x, origin.y - ESCAPE_SNAP_Y);
        self.escaping = true;
        self.escape_frame = 0;
        self.escape_counter = 0;
    }

    pub fn apply_powerup(&mut self, kind: PowerupKind) {
        match kind {
            PowerupKind::Life => self.lives += 1,
            PowerupKind::Bomb => self.max_bombs += 5,
            PowerupKind::Score => self.score += 300,
            PowerupKind::Radius => self.radius += 1,
            PowerupKind::Speed => self.speed += 1,
            PowerupKind::Invincibility => self.make_invincible(),
        }
    }

    /// Keep the hitbox inside the grid's pixel extents
    fn clamp_to(&mut self, tiles: &TileGrid) {
        let width = tiles.cols() as i32 * TILE_SIZE;
        let height = tiles.rows() as i32 * TILE_SIZE;
        let min = -self.hitbox.offset;
        let max = IVec2::new(width, height) - self.hitbox.offset - self.hitbox.size - IVec2::ONE;
        self.pos = self.pos.clamp(min, max.max(min));
    }

    /// Advance one tick.
    ///
    /// `held` is the highest-priority direction key currently down.
    pub fn update(
        &mut self,
        held: Option<Direction>,
        tiles: &TileGrid,
        occupancy: &mut OccupancyGrid,
        events: &mut Vec<GameEvent>,
    ) {
        if self.invincible {
            self.invincible_ticks = self.invincible_ticks.saturating_sub(1);
            if self.invincible_ticks == 0 {
                self.invincible = false;
                self.blink = false;
            }
        }

        let moving = if self.hit || self.escaping { None } else { held };
        if let Some(direction) = moving {
            self.set_direction(direction);
            self.blocked = check_blocked(self, tiles, occupancy, self.on_bomb);
            let step = if self.blocked {
                slide_offset(self, tiles)
            } else {
                direction.delta() * self.speed
            };
            self.pos += step;
            self.clamp_to(tiles);
        }

        self.track_bomb(occupancy);

        if self.hit {
            if !self.penalty_applied {
                self.score = self.score.saturating_sub(HIT_PENALTY);
                self.penalty_applied = true;
            }
        } else {
            self.penalty_applied = false;
        }

        self.animate(moving.is_some(), events);
    }

    fn track_bomb(&mut self, occupancy: &mut OccupancyGrid) {
        let under = self.anchor_tile().and_then(|at| occupancy.get(at)).copied();
        if under == Some(Occupancy::Live) {
            self.on_bomb = true;
            return;
        }
        self.on_bomb = false;
        if let Some(last) = self.last_bomb
            && occupancy.get(last) == Some(&Occupancy::Live)
        {
            occupancy.set(last, Occupancy::Sealed);
        }
    }

    fn animate(&mut self, walking: bool, events: &mut Vec<GameEvent>) {
        if self.invincible {
            self.blink = !self.blink;
        }

        if self.hit {
            if !self.death_cue_played {
                events.push(GameEvent::sound(SoundEffect::AvatarDies));
                self.death_cue_played = true;
            }
            self.death_counter += 1;
            if self.death_counter >= DEATH_FRAME_TICKS {
                self.death_counter = 0;
                if self.death_frame < DEATH_FRAMES - 1 {
                    self.death_frame += 1;
                } else {
                    self.lives = self.lives.saturating_sub(1);
                    self.respawn();
                    self.death_cue_played = false;
                    events.push(GameEvent::LifeLost {
                        lives_left: self.lives,
                    });
                }
            }
        } else {
            self.death_cue_played = false;
        }

        if self.escaping {
            self.escape_counter += 1;
            if self.escape_counter >= DEATH_FRAME_TICKS {
                self.escape_counter = 0;
                if self.escape_frame < ESCAPE_FRAMES - 1 {
                    self.escape_frame += 1;
                } else {
                    self.respawn();
                    self.victorious = true;
                    self.escape_frame = 0;
                }
            }
        } else if walking {
            self.walk_counter += 1;
            if self.walk_counter >= WALK_FRAME_TICKS {
                self.walk_counter = 0;
                self.walk_frame = self.walk_frame % 4 + 1;
            }
            self.step_counter += 1;
            if self.step_counter >= STEP_CUE_TICKS {
                self.step_counter = 0;
                events.push(GameEvent::Sound(SoundCue::with_volume(
                    SoundEffect::Step,
                    STEP_VOLUME,
                )));
            }
        } else {
            self.walk_frame = 1;
            self.step_counter = STEP_COUNTER_IDLE;
        }
    }
}

impl Body for Avatar {
    fn pos(&self) -> IVec2 {
        self.pos
    }

    fn hitbox(&self) -> Hitbox {
        self.hitbox
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn speed(&self) -> i32 {
        self.speed
    }
}
