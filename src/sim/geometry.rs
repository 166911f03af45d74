//! Tile-space geometry shared by every entity
//!
//! Positions are integer pixels. A tile is `TILE_SIZE` pixels square and
//! addressed by (row, col).

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::TILE_SIZE;

/// Facing / travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step in pixel space (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    /// The three directions other than `self`, in declaration order
    pub fn others(self) -> [Direction; 3] {
        let mut out = [Direction::Up; 3];
        let mut i = 0;
        for dir in Self::ALL {
            if dir != self {
                out[i] = dir;
                i += 1;
            }
        }
        out
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// A tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub row: usize,
    pub col: usize,
}

impl TileCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Tile containing a pixel, or `None` for negative coordinates
    pub fn from_pixel(x: i32, y: i32) -> Option<Self> {
        if x < 0 || y < 0 {
            return None;
        }
        Some(Self::new((y / TILE_SIZE) as usize, (x / TILE_SIZE) as usize))
    }

    /// Step `steps` tiles in `dir`. Upper bounds are the grid's business.
    pub fn offset(self, dir: Direction, steps: usize) -> Option<Self> {
        match dir {
            Direction::Up => self.row.checked_sub(steps).map(|row| Self::new(row, self.col)),
            Direction::Down => Some(Self::new(self.row + steps, self.col)),
            Direction::Left => self.col.checked_sub(steps).map(|col| Self::new(self.row, col)),
            Direction::Right => Some(Self::new(self.row, self.col + steps)),
        }
    }

    /// Top-left pixel of the tile
    pub fn origin(self) -> IVec2 {
        IVec2::new(self.col as i32 * TILE_SIZE, self.row as i32 * TILE_SIZE)
    }
}

/// Solid area relative to an entity's position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hitbox {
    pub offset: IVec2,
    pub size: IVec2,
}

impl Hitbox {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            offset: IVec2::new(x, y),
            size: IVec2::new(w, h),
        }
    }
}

/// Axis-aligned rectangle in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub min: IVec2,
    pub size: IVec2,
}

impl Rect {
    pub fn new(min: IVec2, size: IVec2) -> Self {
        Self { min, size }
    }

    pub fn left(&self) -> i32 {
        self.min.x
    }

    pub fn right(&self) -> i32 {
        self.min.x + self.size.x
    }

    pub fn top(&self) -> i32 {
        self.min.y
    }

    pub fn bottom(&self) -> i32 {
        self.min.y + self.size.y
    }

    pub fn translated(&self, by: IVec2) -> Self {
        Self::new(self.min + by, self.size)
    }

    /// Strict overlap: touching edges do not intersect, empty rects never do
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.size.x <= 0 || self.size.y <= 0 || other.size.x <= 0 || other.size.y <= 0 {
            return false;
        }
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

/// Capabilities shared by the avatar and enemies
pub trait Body {
    fn pos(&self) -> IVec2;
    fn hitbox(&self) -> Hitbox;
    fn direction(&self) -> Direction;
    fn speed(&self) -> i32;

    /// Hitbox in world coordinates
    fn world_rect(&self) -> Rect {
        let hb = self.hitbox();
        Rect::new(self.pos() + hb.offset, hb.size)
    }

    /// Hitbox after one step in the current direction
    fn projected_rect(&self) -> Rect {
        self.world_rect()
            .translated(self.direction().delta() * self.speed())
    }

    /// Tile under the horizontal centre of the hitbox's bottom edge
    fn anchor_tile(&self) -> Option<TileCoord> {
        let rect = self.world_rect();
        TileCoord::from_pixel(rect.left() + rect.size.x / 2, rect.bottom())
    }
}
