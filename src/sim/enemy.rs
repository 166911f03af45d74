//! Enemy state machines (ground wanderers and flyers)

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{check_blocked, check_blocked_flying, touches_damage};
use super::events::GameEvent;
use super::geometry::{Body, Direction, Hitbox, TileCoord};
use super::grid::{DamageGrid, OccupancyGrid, TileGrid};
use crate::audio::SoundEffect;
use crate::consts::*;

const WANDERER_HITBOX: Hitbox = Hitbox::new(0, 27, 53, 58);
const FLYER_HITBOX: Hitbox = Hitbox::new(0, 22, 53, 62);

/// Enemy variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Ground walker, dies to a single blast
    Wanderer,
    /// Floats over destructible walls; shrugs off hits while invincible
    Flyer { invincible_ticks: u32 },
}

impl EnemyKind {
    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Wanderer => "wanderer",
            EnemyKind::Flyer { .. } => "flyer",
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        match self {
            EnemyKind::Wanderer => WANDERER_HITBOX,
            EnemyKind::Flyer { .. } => FLYER_HITBOX,
        }
    }

    fn lives(&self) -> u32 {
        match self {
            EnemyKind::Wanderer => 1,
            EnemyKind::Flyer { .. } => 2,
        }
    }

    fn points(&self) -> u64 {
        match self {
            EnemyKind::Wanderer => 200,
            EnemyKind::Flyer { .. } => 350,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub pos: IVec2,
    pub direction: Direction,
    pub speed: i32,
    pub lives: u32,
    /// Score credited when the death sequence finishes
    pub points: u64,
    pub blocked: bool,
    pub hit: bool,
    pub dead: bool,
    /// Death sequence complete; ready for removal
    pub finished: bool,
    pub death_frame: u32,
    death_counter: u32,
    death_cue_played: bool,
}

impl Enemy {
    /// Spawn standing on `tile`, feet on the tile's bottom edge
    pub fn spawn(kind: EnemyKind, tile: TileCoord) -> Self {
        let hitbox = kind.hitbox();
        let origin = tile.origin();
        Self {
            kind,
            pos: IVec2::new(origin.x, origin.y - hitbox.offset.y),
            direction: Direction::Down,
            speed: ENEMY_SPEED,
            lives: kind.lives(),
            points: kind.points(),
            blocked: false,
            hit: false,
            dead: false,
            finished: false,
            death_frame: 0,
            death_counter: 0,
            death_cue_played: false,
        }
    }

    pub fn wanderer(tile: TileCoord) -> Self {
        Self::spawn(EnemyKind::Wanderer, tile)
    }

    pub fn flyer(tile: TileCoord) -> Self {
        Self::spawn(EnemyKind::Flyer { invincible_ticks: 0 }, tile)
    }

    pub fn is_invincible(&self) -> bool {
        matches!(self.kind, EnemyKind::Flyer { invincible_ticks } if invincible_ticks > 0)
    }

    /// Pick one of the other three directions uniformly
    pub fn turn<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let others = self.direction.others();
        self.direction = others[rng.random_range(0..others.len())];
    }

    fn wants_random_turn<R: Rng + ?Sized>(rng: &mut R) -> bool {
        rng.random_range(0..TURN_ROLL) <= TURN_THRESHOLD
    }

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        tiles: &TileGrid,
        occupancy: &OccupancyGrid,
        damage: &DamageGrid,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        if let EnemyKind::Flyer { invincible_ticks } = &mut self.kind {
            *invincible_ticks = invincible_ticks.saturating_sub(1);
        }

        if !self.dead {
            if self.hit {
                self.take_hit();
            } else {
                self.wander(tiles, occupancy, rng);
                if touches_damage(self, damage) && !self.is_invincible() {
                    self.hit = true;
                }
            }
        }

        self.animate(events);
    }

    fn wander<R: Rng + ?Sized>(&mut self, tiles: &TileGrid, occupancy: &OccupancyGrid, rng: &mut R) {
        let grounded = match self.kind {
            EnemyKind::Wanderer => true,
            // A flyer out of lives hovers in place until finished off
            EnemyKind::Flyer { .. } if self.lives == 0 => return,
            EnemyKind::Flyer { .. } => false,
        };
        self.blocked = if grounded {
            check_blocked(self, tiles, occupancy, false)
        } else {
            check_blocked_flying(self, tiles, occupancy)
        };
        if !self.blocked {
            self.pos += self.direction.delta() * self.speed;
        }
        if self.blocked || Self::wants_random_turn(rng) {
            self.turn(rng);
        }
    }

    fn take_hit(&mut self) {
        match &mut self.kind {
            EnemyKind::Wanderer => {
                self.lives = self.lives.saturating_sub(1);
                if self.lives == 0 {
                    self.dead = true;
                }
            }
            EnemyKind::Flyer { invincible_ticks } => {
                if self.lives >= 1 && *invincible_ticks == 0 {
                    self.lives -= 1;
                    *invincible_ticks = FLYER_INVINCIBLE_TICKS;
                } else if self.lives == 0 {
                    self.dead = true;
                }
            }
        }
        self.hit = false;
    }

    fn animate(&mut self, events: &mut Vec<GameEvent>) {
        if !self.dead || self.finished {
            return;
        }
        if !self.death_cue_played {
            events.push(GameEvent::sound(SoundEffect::EnemyDies));
            self.death_cue_played = true;
        }
        self.death_counter += 1;
        if self.death_counter >= DEATH_FRAME_TICKS {
            self.death_counter = 0;
            if self.death_frame < ENEMY_DEATH_FRAMES - 1 {
                self.death_frame += 1;
            } else {
                self.finished = true;
            }
        }
    }
}

impl Body for Enemy {
    fn pos(&self) -> IVec2 {
        self.pos
    }

    fn hitbox(&self) -> Hitbox {
        self.kind.hitbox()
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn speed(&self) -> i32 {
        self.speed
    }
}
