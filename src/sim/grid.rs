//! Tile grid, bomb occupancy and damage overlays
//!
//! All three are row-major grids of the same dimensions. Lookups take a
//! `TileCoord` and return `Option`, so out-of-range access never panics.

use serde::{Deserialize, Serialize};

use super::geometry::TileCoord;
use crate::consts::{CRUMBLE_FRAME_TICKS, CRUMBLE_PHASES};
use crate::error::LevelError;

/// Stat bonus carried by a powerup tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Radius,
    Speed,
    Life,
    Score,
    Invincibility,
    Bomb,
}

/// Tile type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Floor,
    DestructibleWall,
    IndestructibleWall,
    /// Rows reserved for the HUD strip; never walkable
    HudReserved,
    Escape,
    Powerup(PowerupKind),
}

impl TileKind {
    /// Numeric code used by the level file format
    pub fn code(self) -> u8 {
        match self {
            TileKind::Floor => 0,
            TileKind::DestructibleWall => 1,
            TileKind::IndestructibleWall => 2,
            TileKind::HudReserved => 3,
            TileKind::Escape => 4,
            TileKind::Powerup(PowerupKind::Radius) => 5,
            TileKind::Powerup(PowerupKind::Speed) => 6,
            TileKind::Powerup(PowerupKind::Life) => 7,
            TileKind::Powerup(PowerupKind::Score) => 8,
            TileKind::Powerup(PowerupKind::Invincibility) => 9,
            TileKind::Powerup(PowerupKind::Bomb) => 10,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => TileKind::Floor,
            1 => TileKind::DestructibleWall,
            2 => TileKind::IndestructibleWall,
            3 => TileKind::HudReserved,
            4 => TileKind::Escape,
            5 => TileKind::Powerup(PowerupKind::Radius),
            6 => TileKind::Powerup(PowerupKind::Speed),
            7 => TileKind::Powerup(PowerupKind::Life),
            8 => TileKind::Powerup(PowerupKind::Score),
            9 => TileKind::Powerup(PowerupKind::Invincibility),
            10 => TileKind::Powerup(PowerupKind::Bomb),
            _ => return None,
        })
    }

    pub fn blocks_movement(self) -> bool {
        matches!(
            self,
            TileKind::DestructibleWall | TileKind::IndestructibleWall | TileKind::HudReserved
        )
    }

    /// Flyers pass over destructible walls
    pub fn blocks_flying(self) -> bool {
        matches!(self, TileKind::IndestructibleWall | TileKind::HudReserved)
    }
}

/// What a destructible wall turns into once it has crumbled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reveal {
    #[default]
    Nothing,
    Escape,
    Powerup(PowerupKind),
}

impl Reveal {
    fn into_kind(self) -> TileKind {
        match self {
            Reveal::Nothing => TileKind::Floor,
            Reveal::Escape => TileKind::Escape,
            Reveal::Powerup(kind) => TileKind::Powerup(kind),
        }
    }
}

/// One cell of the level
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileCell {
    kind: TileKind,
    blocks_movement: bool,
    /// Collected pickup waiting to revert to floor
    pub stepped: bool,
    /// Caught by a blast; crumbling
    pub hit: bool,
    /// Crumble progress, 0..=CRUMBLE_PHASES
    pub hit_phase: u32,
    /// Hidden content revealed when the wall crumbles
    pub reveal: Reveal,
    /// Powerup already applied
    pub collected: bool,
}

impl TileCell {
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            blocks_movement: kind.blocks_movement(),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn blocks_movement(&self) -> bool {
        self.blocks_movement
    }

    /// Replace the cell wholesale with a fresh one of `kind`
    pub fn convert(&mut self, kind: TileKind) {
        *self = Self::new(kind);
    }
}

/// Fixed-size row-major grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, at: TileCoord) -> Option<usize> {
        (at.row < self.rows && at.col < self.cols).then(|| at.row * self.cols + at.col)
    }

    pub fn contains(&self, at: TileCoord) -> bool {
        self.index(at).is_some()
    }

    pub fn get(&self, at: TileCoord) -> Option<&T> {
        self.index(at).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, at: TileCoord) -> Option<&mut T> {
        self.index(at).map(|i| &mut self.cells[i])
    }

    /// Returns false when `at` is out of range
    pub fn set(&mut self, at: TileCoord, value: T) -> bool {
        match self.get_mut(at) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + use<T> {
        let cols = self.cols;
        (0..self.rows * self.cols).map(move |i| TileCoord::new(i / cols, i % cols))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &T)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (TileCoord::new(i / cols, i % cols), cell))
    }

    pub fn map<U, F: Fn(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

/// Bomb occupancy of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Occupancy {
    #[default]
    Empty,
    /// Bomb the avatar has stepped off; blocks everyone
    Sealed,
    /// Freshly placed bomb the avatar may still be standing on
    Live,
}

impl Occupancy {
    pub fn code(self) -> u8 {
        match self {
            Occupancy::Empty => 0,
            Occupancy::Sealed => 1,
            Occupancy::Live => 2,
        }
    }
}

pub type OccupancyGrid = Grid<Occupancy>;

/// Hazard overlay, reference counted per cell so overlapping blasts
/// release only their own claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageGrid {
    counts: Grid<u16>,
}

impl DamageGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            counts: Grid::filled(rows, cols, 0),
        }
    }

    pub fn claim(&mut self, cells: &[TileCoord]) {
        for &at in cells {
            if let Some(count) = self.counts.get_mut(at) {
                *count = count.saturating_add(1);
            }
        }
    }

    pub fn release(&mut self, cells: &[TileCoord]) {
        for &at in cells {
            if let Some(count) = self.counts.get_mut(at) {
                *count = count.saturating_sub(1);
            }
        }
    }

    pub fn is_hazard(&self, at: Option<TileCoord>) -> bool {
        at.and_then(|at| self.counts.get(at))
            .is_some_and(|&count| count > 0)
    }

    /// True once every blast has released its cells
    pub fn is_clear(&self) -> bool {
        self.counts.iter().all(|(_, &count)| count == 0)
    }

    pub fn hazard_cells(&self) -> Vec<TileCoord> {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(at, _)| at)
            .collect()
    }
}

/// Outcome of one crumble pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrumbleReport {
    /// Walls that just started visibly crumbling
    pub started: u32,
    /// Walls that finished and became something else
    pub revealed: Vec<(TileCoord, TileKind)>,
}

/// The level's tile cells plus the crumble countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    cells: Grid<TileCell>,
    crumble_counter: u32,
}

impl TileGrid {
    /// Build from a grid of tile codes
    pub fn from_codes(codes: &Grid<u8>) -> Result<Self, LevelError> {
        let mut cells = Grid::filled(codes.rows(), codes.cols(), TileCell::default());
        for (at, &code) in codes.iter() {
            let kind = TileKind::from_code(code).ok_or(LevelError::UnknownCode {
                row: at.row,
                col: at.col,
                code,
            })?;
            cells.set(at, TileCell::new(kind));
        }
        Ok(Self {
            cells,
            crumble_counter: 0,
        })
    }

    pub fn codes(&self) -> Grid<u8> {
        self.cells.map(|cell| cell.kind().code())
    }

    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    pub fn cols(&self) -> usize {
        self.cells.cols()
    }

    pub fn cells(&self) -> &Grid<TileCell> {
        &self.cells
    }

    pub fn contains(&self, at: TileCoord) -> bool {
        self.cells.contains(at)
    }

    pub fn get(&self, at: Option<TileCoord>) -> Option<&TileCell> {
        at.and_then(|at| self.cells.get(at))
    }

    pub fn get_mut(&mut self, at: Option<TileCoord>) -> Option<&mut TileCell> {
        at.and_then(|at| self.cells.get_mut(at))
    }

    pub fn kind_at(&self, at: Option<TileCoord>) -> Option<TileKind> {
        self.get(at).map(TileCell::kind)
    }

    /// Out-of-grid counts as wall
    pub fn blocks(&self, at: Option<TileCoord>) -> bool {
        self.get(at).is_none_or(TileCell::blocks_movement)
    }

    pub fn blocks_flying(&self, at: Option<TileCoord>) -> bool {
        self.kind_at(at).is_none_or(TileKind::blocks_flying)
    }

    pub fn mark_hit(&mut self, at: TileCoord) {
        if let Some(cell) = self.cells.get_mut(at) {
            cell.hit = true;
        }
    }

    /// Advance the crumble countdown by one tick.
    ///
    /// Every `CRUMBLE_FRAME_TICKS` ticks, collected pickups revert to floor
    /// and each hit wall advances one phase; a wall past its last phase
    /// becomes its reveal.
    pub fn update(&mut self) -> CrumbleReport {
        let mut report = CrumbleReport::default();
        self.crumble_counter += 1;
        if self.crumble_counter < CRUMBLE_FRAME_TICKS {
            return report;
        }
        self.crumble_counter = 0;

        for at in self.cells.coords() {
            let Some(cell) = self.cells.get_mut(at) else {
                continue;
            };
            if cell.stepped {
                cell.convert(TileKind::Floor);
            }
            if cell.hit {
                let phase = cell.hit_phase;
                if phase == 1 {
                    report.started += 1;
                }
                cell.hit_phase += 1;
                if phase >= CRUMBLE_PHASES {
                    let kind = cell.reveal.into_kind();
                    cell.convert(kind);
                    report.revealed.push((at, kind));
                }
            }
        }
        report
    }
}
