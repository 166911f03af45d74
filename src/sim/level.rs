//! Level construction
//!
//! A level is generated as a grid of tile codes, written out in the text
//! format, read back, and only then turned into a `TileGrid`. Hidden escape
//! and powerup content is seeded into the destructible walls afterwards, and
//! enemies are dropped onto random free floor.

use std::path::Path;

use rand::Rng;

use super::enemy::{Enemy, EnemyKind};
use super::geometry::TileCoord;
use super::grid::{Grid, Reveal, TileGrid, TileKind};
use crate::consts::{MAP_COLS, MAP_ROWS};
use crate::error::LevelError;
use crate::tuning::LevelTuning;

/// Cells around the avatar spawn that never hold walls or enemies
pub const SPAWN_PROTECTED: [TileCoord; 3] = [
    TileCoord::new(3, 2),
    TileCoord::new(3, 3),
    TileCoord::new(4, 2),
];

/// Extra indestructible pillars; one set is picked per level
const PILLAR_LAYOUTS: [[(usize, usize); 8]; 3] = [
    [
        (3, 5),
        (5, 9),
        (3, 11),
        (11, 12),
        (10, 5),
        (8, 8),
        (13, 2),
        (11, 6),
    ],
    [
        (5, 3),
        (7, 9),
        (5, 11),
        (11, 3),
        (10, 5),
        (12, 8),
        (13, 14),
        (9, 15),
    ],
    [
        (3, 6),
        (4, 6),
        (5, 12),
        (6, 14),
        (8, 2),
        (10, 4),
        (11, 8),
        (11, 14),
    ],
];

const FLOOR: u8 = 0;
const DESTRUCTIBLE: u8 = 1;
const WALL: u8 = 2;
const HUD: u8 = 3;
/// Highest code allowed in a level file
const MAX_FILE_CODE: u8 = HUD;

/// A freshly built level
#[derive(Debug, Clone)]
pub struct Level {
    pub number: u32,
    pub tiles: TileGrid,
    pub enemies: Vec<Enemy>,
    pub timer_secs: u32,
}

fn is_protected(at: TileCoord) -> bool {
    SPAWN_PROTECTED.contains(&at)
}

/// Remove and return a random element
fn take_random<T, R: Rng + ?Sized>(pool: &mut Vec<T>, rng: &mut R) -> Option<T> {
    if pool.is_empty() {
        None
    } else {
        Some(pool.swap_remove(rng.random_range(0..pool.len())))
    }
}

/// Border, pillar lattice, one extra pillar set and HUD strip
fn base_layout<R: Rng + ?Sized>(rng: &mut R) -> Grid<u8> {
    let mut codes = Grid::filled(MAP_ROWS, MAP_COLS, FLOOR);

    for row in 0..MAP_ROWS {
        for col in [0, 1, MAP_COLS - 2, MAP_COLS - 1] {
            codes.set(TileCoord::new(row, col), WALL);
        }
    }
    for row in 3..MAP_ROWS - 1 {
        for col in 2..MAP_COLS - 2 {
            let open = (row - 3) % 2 == 0 || (col - 2) % 2 == 0;
            codes.set(TileCoord::new(row, col), if open { FLOOR } else { WALL });
        }
    }

    let layout = &PILLAR_LAYOUTS[rng.random_range(0..PILLAR_LAYOUTS.len())];
    for &(row, col) in layout {
        codes.set(TileCoord::new(row, col), WALL);
    }

    for col in 0..MAP_COLS {
        codes.set(TileCoord::new(2, col), WALL);
        codes.set(TileCoord::new(MAP_ROWS - 1, col), WALL);
        codes.set(TileCoord::new(0, col), HUD);
        codes.set(TileCoord::new(1, col), HUD);
    }
    for at in SPAWN_PROTECTED {
        codes.set(at, FLOOR);
    }
    codes
}

/// Procedurally generate a level layout with `destructible` breakable walls.
///
/// If there are fewer free cells than requested, every free cell is used.
pub fn generate_layout<R: Rng + ?Sized>(rng: &mut R, destructible: usize) -> Grid<u8> {
    let mut codes = base_layout(rng);
    let mut free: Vec<TileCoord> = codes
        .iter()
        .filter(|(at, code)| {
            **code == FLOOR
                && (3..=MAP_ROWS - 2).contains(&at.row)
                && (2..=MAP_COLS - 3).contains(&at.col)
                && !is_protected(*at)
        })
        .map(|(at, _)| at)
        .collect();

    for _ in 0..destructible {
        let Some(at) = take_random(&mut free, rng) else {
            log::warn!("Only room for fewer than {} destructible walls", destructible);
            break;
        };
        codes.set(at, DESTRUCTIBLE);
    }
    codes
}

/// Serialize a layout: one line per row, codes separated by single spaces
pub fn layout_to_string(codes: &Grid<u8>) -> String {
    let mut out = String::with_capacity(codes.rows() * (codes.cols() * 2 + 1));
    for row in 0..codes.rows() {
        let line: Vec<String> = (0..codes.cols())
            .filter_map(|col| codes.get(TileCoord::new(row, col)))
            .map(u8::to_string)
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Parse a layout, rejecting anything that is not a full grid of codes 0-3
pub fn parse_layout(text: &str) -> Result<Grid<u8>, LevelError> {
    let mut codes = Grid::filled(MAP_ROWS, MAP_COLS, FLOOR);
    let rows: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if rows.len() != MAP_ROWS {
        return Err(LevelError::RowCount {
            expected: MAP_ROWS,
            actual: rows.len(),
        });
    }

    for (row, line) in rows.into_iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != MAP_COLS {
            return Err(LevelError::Dimensions {
                expected_rows: MAP_ROWS,
                expected_cols: MAP_COLS,
                row,
                cols: tokens.len(),
            });
        }
        for (col, token) in tokens.into_iter().enumerate() {
            let code: u8 = token.parse().map_err(|_| LevelError::BadToken {
                row,
                token: token.to_string(),
            })?;
            if code > MAX_FILE_CODE {
                return Err(LevelError::UnknownCode { row, col, code });
            }
            codes.set(TileCoord::new(row, col), code);
        }
    }
    Ok(codes)
}

pub fn write_layout(path: &Path, codes: &Grid<u8>) -> Result<(), LevelError> {
    std::fs::write(path, layout_to_string(codes)).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_layout(path: &Path) -> Result<Grid<u8>, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layout(&text)
}

fn hide_under<R: Rng + ?Sized>(
    tiles: &mut TileGrid,
    walls: &mut Vec<TileCoord>,
    reveal: Reveal,
    rng: &mut R,
) {
    if let Some(at) = take_random(walls, rng)
        && let Some(cell) = tiles.get_mut(Some(at))
    {
        cell.reveal = reveal;
    }
}

/// Hide the escape and the level's powerups under destructible walls
pub fn seed_hidden<R: Rng + ?Sized>(tiles: &mut TileGrid, tuning: &LevelTuning, rng: &mut R) {
    let mut walls: Vec<TileCoord> = tiles
        .cells()
        .iter()
        .filter(|(_, cell)| cell.kind() == TileKind::DestructibleWall)
        .map(|(at, _)| at)
        .collect();

    hide_under(tiles, &mut walls, Reveal::Escape, rng);
    for &kind in &tuning.guaranteed {
        hide_under(tiles, &mut walls, Reveal::Powerup(kind), rng);
    }
    for roll in &tuning.chances {
        if rng.random_bool(roll.chance.clamp(0.0, 1.0)) {
            hide_under(tiles, &mut walls, Reveal::Powerup(roll.kind), rng);
        }
    }
}

/// Place the level's enemies on distinct free floor tiles
pub fn spawn_enemies<R: Rng + ?Sized>(
    tiles: &TileGrid,
    tuning: &LevelTuning,
    rng: &mut R,
) -> Vec<Enemy> {
    let mut free: Vec<TileCoord> = tiles
        .cells()
        .iter()
        .filter(|(at, cell)| cell.kind() == TileKind::Floor && !is_protected(*at))
        .map(|(at, _)| at)
        .collect();

    let roster = std::iter::repeat_n(EnemyKind::Wanderer, tuning.wanderers).chain(
        std::iter::repeat_n(EnemyKind::Flyer { invincible_ticks: 0 }, tuning.flyers),
    );
    let mut enemies = Vec::new();
    for kind in roster {
        match take_random(&mut free, rng) {
            Some(at) => enemies.push(Enemy::spawn(kind, at)),
            None => break,
        }
    }
    enemies
}

/// Generate, persist, reload and populate a level.
///
/// With `map_path` the layout goes through that file; otherwise it goes
/// through its text form in memory.
pub fn build_level<R: Rng + ?Sized>(
    number: u32,
    tuning: &LevelTuning,
    rng: &mut R,
    map_path: Option<&Path>,
) -> Result<Level, LevelError> {
    let generated = generate_layout(rng, tuning.destructible_walls);
    let codes = match map_path {
        Some(path) => {
            write_layout(path, &generated)?;
            read_layout(path)?
        }
        None => parse_layout(&layout_to_string(&generated))?,
    };

    let mut tiles = TileGrid::from_codes(&codes)?;
    seed_hidden(&mut tiles, tuning, rng);
    let enemies = spawn_enemies(&tiles, tuning, rng);
    log::info!(
        "Built level {}: {} destructible walls, {} enemies, {}s clock",
        number,
        tuning.destructible_walls,
        enemies.len(),
        tuning.timer_secs
    );

    Ok(Level {
        number,
        tiles,
        enemies,
        timer_secs: tuning.timer_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::Body;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn count(codes: &Grid<u8>, code: u8) -> usize {
        codes.iter().filter(|(_, c)| **c == code).count()
    }

    #[test]
    fn test_border_pattern() {
        let mut rng = Pcg32::seed_from_u64(42);
        let codes = generate_layout(&mut rng, 35);
        for col in 0..MAP_COLS {
            assert_eq!(codes.get(TileCoord::new(0, col)), Some(&HUD));
            assert_eq!(codes.get(TileCoord::new(1, col)), Some(&HUD));
            assert_eq!(codes.get(TileCoord::new(2, col)), Some(&WALL));
            assert_eq!(codes.get(TileCoord::new(14, col)), Some(&WALL));
        }
        for row in 2..MAP_ROWS {
            for col in [0, 1, 15, 16] {
                assert_eq!(codes.get(TileCoord::new(row, col)), Some(&WALL));
            }
        }
        for at in SPAWN_PROTECTED {
            assert_eq!(codes.get(at), Some(&FLOOR));
        }
        assert_eq!(count(&codes, DESTRUCTIBLE), 35);
    }

    #[test]
    fn test_layout_round_trip() {
        let mut rng = Pcg32::seed_from_u64(7);
        let codes = generate_layout(&mut rng, 50);
        let text = layout_to_string(&codes);
        assert_eq!(text.lines().count(), MAP_ROWS);
        assert_eq!(parse_layout(&text).unwrap(), codes);
    }

    #[test]
    fn test_layout_file_round_trip() {
        let mut rng = Pcg32::seed_from_u64(11);
        let codes = generate_layout(&mut rng, 40);
        let path = std::env::temp_dir().join(format!(
            "bomb_arena_layout_{}.txt",
            std::process::id()
        ));
        write_layout(&path, &codes).unwrap();
        let back = read_layout(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, codes);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse_layout("0 0 0\n"),
            Err(LevelError::RowCount { .. })
        ));

        let mut rng = Pcg32::seed_from_u64(1);
        let good = layout_to_string(&generate_layout(&mut rng, 10));
        let short = good.replacen("3 3 3", "3 3", 1);
        assert!(matches!(
            parse_layout(&short),
            Err(LevelError::Dimensions { row: 0, .. })
        ));
        let bad_token = good.replacen('3', "x", 1);
        assert!(matches!(
            parse_layout(&bad_token),
            Err(LevelError::BadToken { .. })
        ));
        let bad_code = good.replacen('3', "7", 1);
        assert!(matches!(
            parse_layout(&bad_code),
            Err(LevelError::UnknownCode { code: 7, .. })
        ));
    }

    #[test]
    fn test_hidden_content_on_destructible_walls() {
        let tuning = Tuning::default();
        let level_tuning = tuning.level(1).unwrap();
        let mut rng = Pcg32::seed_from_u64(5);
        let level = build_level(1, level_tuning, &mut rng, None).unwrap();

        let hidden: Vec<_> = level
            .tiles
            .cells()
            .iter()
            .filter(|(_, cell)| cell.reveal != Reveal::Nothing)
            .collect();
        assert!(
            hidden
                .iter()
                .all(|(_, cell)| cell.kind() == TileKind::DestructibleWall)
        );
        let escapes = hidden
            .iter()
            .filter(|(_, cell)| cell.reveal == Reveal::Escape)
            .count();
        assert_eq!(escapes, 1);
        assert!(hidden.len() > level_tuning.guaranteed.len());
    }

    #[test]
    fn test_enemies_on_distinct_free_tiles() {
        let tuning = Tuning::default();
        let level_tuning = tuning.level(3).unwrap();
        let mut rng = Pcg32::seed_from_u64(9);
        let level = build_level(3, level_tuning, &mut rng, None).unwrap();
        assert_eq!(level.enemies.len(), 6);
        let flyers = level
            .enemies
            .iter()
            .filter(|e| matches!(e.kind, EnemyKind::Flyer { .. }))
            .count();
        assert_eq!(flyers, 2);

        let mut tiles: Vec<_> = level.enemies.iter().map(|e| e.anchor_tile()).collect();
        for at in &tiles {
            assert_eq!(level.tiles.kind_at(*at), Some(TileKind::Floor));
            assert!(!is_protected(at.unwrap()));
        }
        tiles.sort_by_key(|t| t.map(|t| (t.row, t.col)));
        tiles.dedup();
        assert_eq!(tiles.len(), 6);
    }
}
