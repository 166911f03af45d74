//! Bombs and the blasts they leave behind

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::collision::{blast_cells, blast_reach};
use super::geometry::TileCoord;
use super::grid::{DamageGrid, TileGrid};
use crate::consts::*;

const BOMB_LAST_FRAME: u32 = 2;
const BLAST_LAST_FRAME: u32 = 4;

/// Step a ping-pong animation between 0 and `last`
fn ping_pong(frame: &mut u32, reverse: &mut bool, last: u32) {
    if *reverse {
        *frame = frame.saturating_sub(1);
        if *frame == 0 {
            *reverse = false;
        }
    } else {
        *frame += 1;
        if *frame >= last {
            *reverse = true;
        }
    }
}

/// A placed bomb counting down its fuse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub tile: TileCoord,
    pub pos: IVec2,
    pub counter: u32,
    pub exploded: bool,
    pub frame: u32,
    reverse: bool,
}

impl Bomb {
    pub fn new(tile: TileCoord) -> Self {
        Self {
            tile,
            pos: tile.origin(),
            counter: 0,
            exploded: false,
            frame: 0,
            reverse: false,
        }
    }

    /// Advance the fuse. Returns true exactly once, on the tick it explodes.
    pub fn update(&mut self) -> bool {
        if self.exploded {
            return false;
        }
        self.counter += 1;
        if self.counter >= FUSE_TICKS {
            self.exploded = true;
            log::debug!("Bomb at {:?} exploded", self.tile);
            return true;
        }
        if self.counter % BOMB_FRAME_TICKS == 0 {
            ping_pong(&mut self.frame, &mut self.reverse, BOMB_LAST_FRAME);
        }
        false
    }
}

/// Active explosion holding its damage cells for a fixed window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blast {
    pub center: TileCoord,
    pub max_radius: u32,
    /// Reach per direction (up, down, left, right)
    pub reach: [u32; 4],
    cells: Vec<TileCoord>,
    pub counter: u32,
    pub frame: u32,
    reverse: bool,
}

impl Blast {
    /// Propagate from `center` and claim the covered cells.
    ///
    /// Reach is computed once here; the grid does not change shape while a
    /// blast is alive.
    pub fn ignite(
        center: TileCoord,
        radius: u32,
        tiles: &mut TileGrid,
        damage: &mut DamageGrid,
    ) -> Self {
        let reach = blast_reach(tiles, center, radius);
        let cells = blast_cells(center, reach);
        damage.claim(&cells);
        Self {
            center,
            max_radius: radius,
            reach,
            cells,
            counter: 0,
            frame: 0,
            reverse: false,
        }
    }

    pub fn cells(&self) -> &[TileCoord] {
        &self.cells
    }

    /// Advance one tick. Returns true once the window has elapsed.
    pub fn update(&mut self) -> bool {
        self.counter += 1;
        if self.counter < BLAST_TICKS && self.counter % BLAST_FRAME_TICKS == 0 {
            ping_pong(&mut self.frame, &mut self.reverse, BLAST_LAST_FRAME);
        }
        self.counter >= BLAST_TICKS
    }

    /// Release exactly the cells claimed at ignition
    pub fn extinguish(self, damage: &mut DamageGrid) {
        damage.release(&self.cells);
    }
}
