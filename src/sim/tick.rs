//! Fixed timestep simulation tick
//!
//! Advances one match by exactly one tick, in a fixed order: level
//! transition, clock and HUD, avatar, tile pickups, avatar damage, bombs,
//! blasts, enemies, bomb placement, body overlaps, end of match.

use super::bomb::{Blast, Bomb};
use super::collision::{crowded, first_contact, touches_damage};
use super::events::{GameEvent, MatchOutcome, SoundCue};
use super::geometry::{Body, Direction};
use super::grid::{Occupancy, TileKind};
use super::state::{GamePhase, GameState};
use crate::audio::SoundEffect;
use crate::consts::*;

const CRUMBLE_VOLUME: f32 = 0.7;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Bomb key is down; only the press edge places a bomb
    pub place_bomb: bool,
    /// Pause toggle
    pub pause: bool,
    /// Resume from pause
    pub confirm: bool,
}

impl TickInput {
    /// Highest-priority held direction (up, down, left, right)
    pub fn held_direction(&self) -> Option<Direction> {
        [
            (self.up, Direction::Up),
            (self.down, Direction::Down),
            (self.left, Direction::Left),
            (self.right, Direction::Right),
        ]
        .into_iter()
        .find_map(|(held, dir)| held.then_some(dir))
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    let bomb_pressed = input.place_bomb && !state.bomb_latch;
    state.bomb_latch = input.place_bomb;

    if state.outcome().is_some() {
        return;
    }

    // Handle pause toggle
    let was_paused = state.is_paused();
    if input.pause {
        state.phase = if was_paused {
            GamePhase::Playing
        } else {
            GamePhase::Paused
        };
    } else if input.confirm && was_paused {
        state.phase = GamePhase::Playing;
    }
    if state.is_paused() != was_paused {
        state.events.push(GameEvent::Paused(state.is_paused()));
    }
    if state.is_paused() {
        return;
    }

    state.time_ticks += 1;

    if state.avatar.victorious {
        clear_level(state);
        if state.outcome().is_some() {
            return;
        }
    }

    if state.clock.advance() && state.avatar.lives > 0 {
        log::debug!("Level clock ran out");
        state.avatar.strike(&mut state.events);
    }
    refresh_hud(state);

    state.avatar.update(
        input.held_direction(),
        &state.tiles,
        &mut state.occupancy,
        &mut state.events,
    );

    step_on_tile(state);

    if !state.avatar.invincible && touches_damage(&state.avatar, &state.damage) {
        state.avatar.strike(&mut state.events);
    }

    update_bombs(state);
    update_blasts(state);
    update_enemies(state);

    if bomb_pressed {
        place_bomb(state);
    }

    resolve_overlaps(state);

    if state.avatar.lives == 0 {
        finish(state, MatchOutcome::Lost);
    }
}

/// Award the cleared level and move on, or end the campaign
fn clear_level(state: &mut GameState) {
    let cleared = state.level;
    let exp = state.tuning.level(cleared).map_or(0, |l| l.clear_exp);
    let avatar = &mut state.avatar;
    avatar.exp += exp;
    avatar.escaping = false;
    avatar.victorious = false;
    avatar.lives += CLEAR_BONUS_LIVES;
    avatar.score += CLEAR_BONUS_SCORE;
    state.events.push(GameEvent::LevelCleared { level: cleared });
    log::info!("Level {} cleared, +{} exp", cleared, exp);

    let next = cleared + 1;
    state.level = next;
    if next > state.tuning.final_level() {
        finish(state, MatchOutcome::Won);
        return;
    }

    if let Err(e) = state.load_level(next) {
        // The layout file is only a round trip; retry in memory
        log::error!("Failed to load level {}: {}", next, e);
        state.map_path = None;
        if let Err(e) = state.load_level(next) {
            log::error!("Level {} unavailable: {}", next, e);
            finish(state, MatchOutcome::Lost);
        }
    }
}

fn refresh_hud(state: &mut GameState) {
    let hud = state.hud_values();
    if hud != state.hud {
        state.hud = hud;
        state.events.push(GameEvent::HudChanged(hud));
    }
}

/// Escape and powerup handling on the avatar's anchor tile
fn step_on_tile(state: &mut GameState) {
    let at = state.avatar.anchor_tile();
    let Some(tile) = at else {
        return;
    };
    match state.tiles.kind_at(at) {
        Some(TileKind::Escape) if state.enemies.is_empty() && !state.avatar.escaping => {
            state.avatar.begin_escape(tile);
            state.events.push(GameEvent::sound(SoundEffect::StageClear));
            state.events.push(GameEvent::EscapeStarted);
            log::info!("Avatar reached the escape on level {}", state.level);
        }
        Some(TileKind::Powerup(kind)) => {
            let Some(cell) = state.tiles.get_mut(at) else {
                return;
            };
            if cell.collected {
                return;
            }
            cell.collected = true;
            cell.stepped = true;
            state.avatar.apply_powerup(kind);
            state.events.push(GameEvent::sound(SoundEffect::ItemGet));
            state
                .events
                .push(GameEvent::PowerupCollected { tile, kind });
        }
        _ => {}
    }
}

fn update_bombs(state: &mut GameState) {
    let mut exploded = Vec::new();
    state.bombs.retain_mut(|bomb| {
        if bomb.update() {
            exploded.push(bomb.tile);
            false
        } else {
            true
        }
    });

    for tile in exploded {
        state.occupancy.set(tile, Occupancy::Empty);
        let blast = Blast::ignite(tile, state.avatar.radius, &mut state.tiles, &mut state.damage);
        state.events.push(GameEvent::sound(SoundEffect::Explosion));
        state.events.push(GameEvent::BombExploded {
            tile,
            reach: blast.reach,
        });
        state.blasts.push(blast);
    }
}

fn update_blasts(state: &mut GameState) {
    let mut alive = Vec::with_capacity(state.blasts.len());
    for mut blast in std::mem::take(&mut state.blasts) {
        if blast.update() {
            state.events.push(GameEvent::BlastEnded {
                center: blast.center,
            });
            blast.extinguish(&mut state.damage);
        } else {
            alive.push(blast);
        }
    }
    state.blasts = alive;

    let report = state.tiles.update();
    if report.started > 0 {
        state.events.push(GameEvent::Sound(SoundCue::with_volume(
            SoundEffect::WallCrumble,
            CRUMBLE_VOLUME,
        )));
    }
    for (tile, kind) in report.revealed {
        state.events.push(GameEvent::TileRevealed { tile, kind });
    }
}

fn update_enemies(state: &mut GameState) {
    for enemy in &mut state.enemies {
        enemy.update(
            &state.tiles,
            &state.occupancy,
            &state.damage,
            &mut state.rng,
            &mut state.events,
        );
    }

    let mut defeated = Vec::new();
    state.enemies.retain(|enemy| {
        if enemy.finished {
            defeated.push((enemy.kind.name(), enemy.points));
            false
        } else {
            true
        }
    });
    for (name, points) in defeated {
        state.avatar.score += points;
        state
            .events
            .push(GameEvent::EnemyDefeated { name, points });
        log::debug!("{} defeated, +{} points", name, points);
    }
}

fn place_bomb(state: &mut GameState) {
    let avatar = &state.avatar;
    if avatar.hit || avatar.escaping || state.bombs.len() >= avatar.max_bombs as usize {
        return;
    }
    let Some(tile) = avatar.anchor_tile() else {
        return;
    };
    if state.occupancy.get(tile) != Some(&Occupancy::Empty) || state.tiles.blocks(Some(tile)) {
        return;
    }

    if let Some(prev) = state.avatar.last_bomb
        && state.occupancy.get(prev) == Some(&Occupancy::Live)
    {
        state.occupancy.set(prev, Occupancy::Sealed);
    }
    state.occupancy.set(tile, Occupancy::Live);
    state.bombs.push(Bomb::new(tile));
    state.avatar.on_bomb = true;
    state.avatar.last_bomb = Some(tile);
    state.events.push(GameEvent::sound(SoundEffect::PlaceBomb));
    state.events.push(GameEvent::BombPlaced { tile });
    log::debug!("Bomb placed at {:?}", tile);
}

fn resolve_overlaps(state: &mut GameState) {
    for i in crowded(&state.enemies) {
        state.enemies[i].turn(&mut state.rng);
    }

    if state.avatar.invincible || state.avatar.hit {
        return;
    }
    let rect = state.avatar.world_rect();
    if let Some(i) = first_contact(&rect, &state.enemies, |e| !e.dead) {
        state.avatar.strike(&mut state.events);
        state.enemies[i].turn(&mut state.rng);
    }
}

/// Record the result exactly once
fn finish(state: &mut GameState, outcome: MatchOutcome) {
    if state.stats_recorded {
        return;
    }
    state.stats_recorded = true;
    state.phase = GamePhase::Finished(outcome);
    let cue = match outcome {
        MatchOutcome::Won => SoundEffect::Victory,
        MatchOutcome::Lost => SoundEffect::Defeat,
    };
    state.events.push(GameEvent::sound(cue));
    state.events.push(GameEvent::MatchFinished {
        outcome,
        score: state.avatar.score,
        exp: state.avatar.exp,
    });
    log::info!(
        "Match finished: {:?}, score {}, exp {}",
        outcome,
        state.avatar.score,
        state.avatar.exp
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::Enemy;
    use crate::sim::geometry::TileCoord;
    use crate::sim::grid::{Grid, PowerupKind, TileGrid};
    use crate::tuning::Tuning;

    /// A match on level 1 with an all-floor grid and no enemies
    fn open_match(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Tuning::default(), None).unwrap();
        state.tiles = TileGrid::from_codes(&Grid::filled(MAP_ROWS, MAP_COLS, 0)).unwrap();
        state.enemies.clear();
        state.drain_events();
        state
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_direction_priority() {
        let input = TickInput {
            left: true,
            down: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(input.held_direction(), Some(Direction::Down));
        assert_eq!(idle().held_direction(), None);
    }

    #[test]
    fn test_bomb_explodes_into_plus_and_clears() {
        let mut state = open_match(1);
        let center = state.avatar.anchor_tile().unwrap();
        let press = TickInput {
            place_bomb: true,
            ..Default::default()
        };
        tick(&mut state, &press);
        assert_eq!(state.bombs.len(), 1);
        assert_eq!(state.occupancy.get(center), Some(&Occupancy::Live));

        // Holding the key does not place more bombs
        for _ in 0..FUSE_TICKS - 1 {
            tick(&mut state, &press);
            assert_eq!(state.bombs.len(), 1);
            assert!(state.blasts.is_empty());
        }
        tick(&mut state, &idle());
        assert!(state.bombs.is_empty());
        assert_eq!(state.blasts.len(), 1);
        assert_eq!(state.occupancy.get(center), Some(&Occupancy::Empty));

        let mut plus = vec![center];
        plus.extend(Direction::ALL.iter().filter_map(|&d| center.offset(d, 1)));
        let mut hazards = state.damage.hazard_cells();
        hazards.sort_by_key(|t| (t.row, t.col));
        plus.sort_by_key(|t| (t.row, t.col));
        assert_eq!(hazards, plus);

        for _ in 0..BLAST_TICKS - 2 {
            tick(&mut state, &idle());
            assert!(state.damage.is_hazard(Some(center)));
        }
        tick(&mut state, &idle());
        assert!(state.blasts.is_empty());
        assert!(state.damage.is_clear());

        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::BombPlaced { .. })), 1);
        assert_eq!(
            count(&events, |e| *e == GameEvent::sound(SoundEffect::Explosion)),
            1
        );
    }

    #[test]
    fn test_four_hits_finish_once() {
        let mut state = open_match(2);
        for lives in (0..AVATAR_LIVES).rev() {
            state.avatar.strike(&mut state.events);
            for _ in 0..DEATH_FRAMES * DEATH_FRAME_TICKS {
                tick(&mut state, &idle());
            }
            assert_eq!(state.avatar.lives, lives);
        }
        for _ in 0..100 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.outcome(), Some(MatchOutcome::Lost));
        assert!(state.stats_recorded);
        let events = state.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, GameEvent::MatchFinished { .. })),
            1
        );
        assert_eq!(
            count(&events, |e| *e == GameEvent::sound(SoundEffect::Defeat)),
            1
        );
    }

    #[test]
    fn test_powerup_applies_once() {
        let mut state = open_match(3);
        let at = state.avatar.anchor_tile();
        if let Some(cell) = state.tiles.get_mut(at) {
            cell.convert(TileKind::Powerup(PowerupKind::Life));
        }
        tick(&mut state, &idle());
        assert_eq!(state.avatar.lives, AVATAR_LIVES + 1);
        for _ in 0..CRUMBLE_FRAME_TICKS * 2 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.avatar.lives, AVATAR_LIVES + 1);
        assert_eq!(state.tiles.kind_at(at), Some(TileKind::Floor));
        let events = state.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, GameEvent::PowerupCollected { .. })),
            1
        );
    }

    #[test]
    fn test_facing_enemies_turn_without_overlap() {
        let mut state = open_match(4);
        let mut a = Enemy::wanderer(TileCoord::new(8, 5));
        a.direction = Direction::Right;
        let mut b = Enemy::wanderer(TileCoord::new(8, 6));
        b.direction = Direction::Left;
        state.enemies = vec![a, b];

        let mut turned = [false; 2];
        for _ in 0..20 {
            tick(&mut state, &idle());
            let [a, b] = [&state.enemies[0], &state.enemies[1]];
            assert!(!a.world_rect().intersects(&b.world_rect()));
            turned[0] |= a.direction != Direction::Right;
            turned[1] |= b.direction != Direction::Left;
        }
        assert_eq!(turned, [true, true]);
    }

    #[test]
    fn test_dying_enemy_does_not_shield_live_contact() {
        let mut state = open_match(9);
        state.avatar.invincible = false;
        let tile = state.avatar.anchor_tile().unwrap();
        let mut dying = Enemy::wanderer(tile);
        dying.dead = true;
        dying.lives = 0;
        state.enemies = vec![dying, Enemy::wanderer(tile)];
        let rect = state.avatar.world_rect();
        assert!(rect.intersects(&state.enemies[1].world_rect()));

        resolve_overlaps(&mut state);
        assert!(state.avatar.hit);
        assert_eq!(
            count(&state.drain_events(), |e| *e == GameEvent::AvatarHit),
            1
        );
    }

    #[test]
    fn test_finished_enemy_removed_and_credited() {
        let mut state = open_match(10);
        let mut enemy = Enemy::wanderer(TileCoord::new(10, 12));
        enemy.hit = true;
        let points = enemy.points;
        state.enemies = vec![enemy];
        let score = state.avatar.score;

        let limit = (ENEMY_DEATH_FRAMES + 1) * DEATH_FRAME_TICKS + 2;
        for _ in 0..limit {
            if state.enemies.is_empty() {
                break;
            }
            tick(&mut state, &idle());
        }
        assert!(state.enemies.is_empty());
        assert_eq!(state.avatar.score, score + points);
        let events = state.drain_events();
        assert_eq!(
            count(&events, |e| *e
                == GameEvent::EnemyDefeated {
                    name: "wanderer",
                    points: 200,
                }),
            1
        );
        assert_eq!(
            count(&events, |e| *e == GameEvent::sound(SoundEffect::EnemyDies)),
            1
        );
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut state = open_match(5);
        for _ in 0..30 {
            tick(&mut state, &idle());
        }
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert!(state.is_paused());
        let frozen_ticks = state.time_ticks;
        let frozen_clock = state.clock.clone();
        let frozen_pos = state.avatar.pos;
        let walk = TickInput {
            right: true,
            ..Default::default()
        };
        for _ in 0..5 * TICK_RATE {
            tick(&mut state, &walk);
        }
        assert_eq!(state.time_ticks, frozen_ticks);
        assert_eq!(state.clock, frozen_clock);
        assert_eq!(state.avatar.pos, frozen_pos);

        let confirm = TickInput {
            confirm: true,
            ..Default::default()
        };
        tick(&mut state, &confirm);
        assert!(!state.is_paused());
        assert_eq!(state.time_ticks, frozen_ticks + 1);
        let events = state.drain_events();
        assert_eq!(
            count(&events, |e| matches!(e, GameEvent::Paused(_))),
            2
        );
    }

    #[test]
    fn test_clock_expiry_strikes_avatar() {
        let mut state = open_match(6);
        state.clock.seconds_left = 1;
        for _ in 0..TICK_RATE {
            tick(&mut state, &idle());
        }
        assert!(state.avatar.hit);
        let events = state.drain_events();
        assert_eq!(count(&events, |e| *e == GameEvent::AvatarHit), 1);
    }

    #[test]
    fn test_escape_clears_level_with_bonus() {
        let mut state = open_match(7);
        let at = state.avatar.anchor_tile();
        if let Some(cell) = state.tiles.get_mut(at) {
            cell.convert(TileKind::Escape);
        }
        tick(&mut state, &idle());
        assert!(state.avatar.escaping);
        while !state.avatar.victorious {
            tick(&mut state, &idle());
        }
        let score = state.avatar.score;
        tick(&mut state, &idle());
        assert_eq!(state.level, 2);
        assert_eq!(state.avatar.lives, AVATAR_LIVES + CLEAR_BONUS_LIVES);
        assert_eq!(state.avatar.score, score + CLEAR_BONUS_SCORE);
        assert_eq!(state.avatar.exp, 100);
        assert!(!state.avatar.escaping);
        assert_eq!(state.clock.duration_secs, 170);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::LevelCleared { level: 1 }));
        assert!(events.contains(&GameEvent::LevelStarted { level: 2 }));
    }

    #[test]
    fn test_clearing_final_level_wins() {
        let mut state = open_match(8);
        state.level = state.tuning.final_level();
        state.avatar.victorious = true;
        tick(&mut state, &idle());
        assert_eq!(state.outcome(), Some(MatchOutcome::Won));
        assert_eq!(state.avatar.exp, 300);
        tick(&mut state, &idle());
        let events = state.drain_events();
        assert_eq!(
            count(&events, |e| matches!(
                e,
                GameEvent::MatchFinished {
                    outcome: MatchOutcome::Won,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(99999, Tuning::default(), None).unwrap();
        let mut state2 = GameState::new(99999, Tuning::default(), None).unwrap();

        let inputs = [
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput {
                place_bomb: true,
                ..Default::default()
            },
            TickInput {
                down: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..100 {
            for input in &inputs {
                tick(&mut state1, input);
                tick(&mut state2, input);
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.avatar.pos, state2.avatar.pos);
        assert_eq!(state1.tiles, state2.tiles);
        let pos1: Vec<_> = state1.enemies.iter().map(|e| e.pos).collect();
        let pos2: Vec<_> = state2.enemies.iter().map(|e| e.pos).collect();
        assert_eq!(pos1, pos2);
        assert_eq!(state1.drain_events(), state2.drain_events());
    }
}
