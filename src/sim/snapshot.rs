//! Read-only, serializable view of a match for renderers and tools

use glam::IVec2;
use serde::Serialize;

use super::avatar::Avatar;
use super::bomb::{Blast, Bomb};
use super::enemy::Enemy;
use super::events::{Hud, MatchOutcome};
use super::geometry::{Direction, TileCoord};
use super::grid::Grid;
use super::state::GameState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvatarView {
    pub pos: IVec2,
    pub direction: Direction,
    pub walk_frame: u32,
    pub death_frame: u32,
    pub escape_frame: u32,
    pub hit: bool,
    pub escaping: bool,
    /// Hidden on this tick of the invincibility blink
    pub blink: bool,
    pub radius: u32,
    pub max_bombs: u32,
    pub speed: i32,
}

impl From<&Avatar> for AvatarView {
    fn from(avatar: &Avatar) -> Self {
        Self {
            pos: avatar.pos,
            direction: avatar.direction,
            walk_frame: avatar.walk_frame,
            death_frame: avatar.death_frame,
            escape_frame: avatar.escape_frame,
            hit: avatar.hit,
            escaping: avatar.escaping,
            blink: avatar.blink,
            radius: avatar.radius,
            max_bombs: avatar.max_bombs,
            speed: avatar.speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyView {
    pub kind: &'static str,
    pub pos: IVec2,
    pub direction: Direction,
    pub dead: bool,
    pub invincible: bool,
    pub death_frame: u32,
}

impl From<&Enemy> for EnemyView {
    fn from(enemy: &Enemy) -> Self {
        Self {
            kind: enemy.kind.name(),
            pos: enemy.pos,
            direction: enemy.direction,
            dead: enemy.dead,
            invincible: enemy.is_invincible(),
            death_frame: enemy.death_frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BombView {
    pub tile: TileCoord,
    pub frame: u32,
}

impl From<&Bomb> for BombView {
    fn from(bomb: &Bomb) -> Self {
        Self {
            tile: bomb.tile,
            frame: bomb.frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlastView {
    pub center: TileCoord,
    pub reach: [u32; 4],
    pub frame: u32,
}

impl From<&Blast> for BlastView {
    fn from(blast: &Blast) -> Self {
        Self {
            center: blast.center,
            reach: blast.reach,
            frame: blast.frame,
        }
    }
}

/// Everything a view needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub paused: bool,
    pub outcome: Option<MatchOutcome>,
    pub hud: Hud,
    /// Tile codes, row-major
    pub tiles: Grid<u8>,
    /// Bomb occupancy codes (0 empty, 1 sealed, 2 live)
    pub occupancy: Grid<u8>,
    /// Crumble phase of every tile currently breaking
    pub crumbling: Vec<(TileCoord, u32)>,
    pub avatar: AvatarView,
    pub enemies: Vec<EnemyView>,
    pub bombs: Vec<BombView>,
    pub blasts: Vec<BlastView>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            tick: state.time_ticks,
            paused: state.is_paused(),
            outcome: state.outcome(),
            hud: state.hud_values(),
            tiles: state.tiles.codes(),
            occupancy: state.occupancy.map(|o| o.code()),
            crumbling: state
                .tiles
                .cells()
                .iter()
                .filter(|(_, cell)| cell.hit)
                .map(|(at, cell)| (at, cell.hit_phase))
                .collect(),
            avatar: AvatarView::from(&state.avatar),
            enemies: state.enemies.iter().map(EnemyView::from).collect(),
            bombs: state.bombs.iter().map(BombView::from).collect(),
            blasts: state.blasts.iter().map(BlastView::from).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_capture_mirrors_state() {
        let state = GameState::new(21, Tuning::default(), None).unwrap();
        let snapshot = Snapshot::capture(&state);
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.hud.level, 1);
        assert_eq!(snapshot.hud.lives, 4);
        assert_eq!(snapshot.enemies.len(), state.enemies.len());
        assert_eq!(snapshot.tiles, state.tiles.codes());
        assert!(snapshot.bombs.is_empty());
    }

    #[test]
    fn test_json_export() {
        let state = GameState::new(21, Tuning::default(), None).unwrap();
        let json = Snapshot::capture(&state).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["hud"]["seconds_left"], 200);
        assert_eq!(value["avatar"]["pos"], serde_json::json!([128, 128]));
    }
}
