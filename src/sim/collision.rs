//! Tile-grid collision detection and response
//!
//! Continuous pixel hitboxes are reduced to the two tiles touched by the
//! leading edge one step ahead. Everything here is a pure function over the
//! entity and the grids, except `blast_reach`, which also marks the walls it
//! runs into.

use glam::IVec2;

use super::geometry::{Body, Direction, Rect, TileCoord};
use super::grid::{DamageGrid, Occupancy, OccupancyGrid, TileGrid, TileKind};

/// Speeds at or above this slide by `SLIDE_CAP` instead
pub const SLIDE_CAP_SPEED: i32 = 5;
pub const SLIDE_CAP: i32 = 4;

/// The two tiles touched by the leading edge after one step.
///
/// Vertical travel yields `[left, right]`, horizontal travel `[top, bottom]`.
pub fn leading_corners<B: Body + ?Sized>(body: &B) -> [Option<TileCoord>; 2] {
    leading_corners_of(body.world_rect(), body.direction(), body.speed())
}

fn leading_corners_of(rect: Rect, dir: Direction, speed: i32) -> [Option<TileCoord>; 2] {
    match dir {
        Direction::Up => {
            let y = rect.top() - speed;
            [
                TileCoord::from_pixel(rect.left(), y),
                TileCoord::from_pixel(rect.right(), y),
            ]
        }
        Direction::Down => {
            let y = rect.bottom() + speed;
            [
                TileCoord::from_pixel(rect.left(), y),
                TileCoord::from_pixel(rect.right(), y),
            ]
        }
        Direction::Left => {
            let x = rect.left() - speed;
            [
                TileCoord::from_pixel(x, rect.top()),
                TileCoord::from_pixel(x, rect.bottom()),
            ]
        }
        Direction::Right => {
            let x = rect.right() + speed;
            [
                TileCoord::from_pixel(x, rect.top()),
                TileCoord::from_pixel(x, rect.bottom()),
            ]
        }
    }
}

fn occupancy_blocks(occupancy: &OccupancyGrid, at: Option<TileCoord>, ignore_live: bool) -> bool {
    match at.and_then(|at| occupancy.get(at)) {
        Some(Occupancy::Sealed) => true,
        Some(Occupancy::Live) => !ignore_live,
        _ => false,
    }
}

/// Would one step in the current direction run into a wall or a bomb?
///
/// `ignore_live` lets the avatar walk off the bomb it is standing on.
pub fn check_blocked<B: Body + ?Sized>(
    body: &B,
    tiles: &TileGrid,
    occupancy: &OccupancyGrid,
    ignore_live: bool,
) -> bool {
    leading_corners(body)
        .into_iter()
        .any(|at| tiles.blocks(at) || occupancy_blocks(occupancy, at, ignore_live))
}

/// Same tile math, but only indestructible terrain and bombs stop a flyer
pub fn check_blocked_flying<B: Body + ?Sized>(
    body: &B,
    tiles: &TileGrid,
    occupancy: &OccupancyGrid,
) -> bool {
    leading_corners(body)
        .into_iter()
        .any(|at| tiles.blocks_flying(at) || occupancy_blocks(occupancy, at, false))
}

/// Perpendicular nudge applied when forward movement is blocked.
///
/// Each free leading corner pushes toward itself; when both are free both
/// pushes apply.
pub fn slide_offset<B: Body + ?Sized>(body: &B, tiles: &TileGrid) -> IVec2 {
    let speed = body.speed();
    let step = if speed >= SLIDE_CAP_SPEED { SLIDE_CAP } else { speed };
    let axis = if body.direction().is_vertical() {
        IVec2::X
    } else {
        IVec2::Y
    };
    let [near, far] = leading_corners(body);

    let mut nudge = IVec2::ZERO;
    if !tiles.blocks(near) {
        nudge -= axis * step;
    }
    if !tiles.blocks(far) {
        nudge += axis * step;
    }
    nudge
}

/// Per-direction blast reach from `center`, in `Direction::ALL` order.
///
/// Propagation stops before any wall; a destructible wall in the way is
/// marked hit.
pub fn blast_reach(tiles: &mut TileGrid, center: TileCoord, radius: u32) -> [u32; 4] {
    let mut reach = [0; 4];
    for (slot, dir) in Direction::ALL.into_iter().enumerate() {
        for step in 1..=radius {
            let Some(at) = center
                .offset(dir, step as usize)
                .filter(|&at| tiles.contains(at))
            else {
                break;
            };
            let Some(kind) = tiles.kind_at(Some(at)) else {
                break;
            };
            match kind {
                TileKind::DestructibleWall => {
                    tiles.mark_hit(at);
                    break;
                }
                TileKind::IndestructibleWall | TileKind::HudReserved => break,
                _ => reach[slot] = step,
            }
        }
    }
    reach
}

/// Center plus every tile within reach
pub fn blast_cells(center: TileCoord, reach: [u32; 4]) -> Vec<TileCoord> {
    let mut cells = vec![center];
    for (dir, len) in Direction::ALL.into_iter().zip(reach) {
        cells.extend((1..=len as usize).filter_map(|step| center.offset(dir, step)));
    }
    cells
}

/// Is the body's anchor tile inside an active blast?
pub fn touches_damage<B: Body + ?Sized>(body: &B, damage: &DamageGrid) -> bool {
    damage.is_hazard(body.anchor_tile())
}

/// Indices of bodies whose next step would overlap another body, either
/// where it stands or where it is about to step
pub fn crowded<B: Body>(bodies: &[B]) -> Vec<usize> {
    bodies
        .iter()
        .enumerate()
        .filter(|(i, body)| {
            let next = body.projected_rect();
            bodies.iter().enumerate().any(|(j, other)| {
                *i != j
                    && (next.intersects(&other.world_rect())
                        || next.intersects(&other.projected_rect()))
            })
        })
        .map(|(i, _)| i)
        .collect()
}

/// First body accepted by `eligible` that overlaps `rect`
pub fn first_contact<B: Body>(
    rect: &Rect,
    bodies: &[B],
    eligible: impl Fn(&B) -> bool,
) -> Option<usize> {
    bodies
        .iter()
        .position(|body| eligible(body) && rect.intersects(&body.world_rect()))
}
