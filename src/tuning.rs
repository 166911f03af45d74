//! Data-driven level balance
//!
//! The defaults reproduce the stock three-level campaign. A JSON file with
//! the same shape can override them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::grid::PowerupKind;

/// A powerup that is hidden with some probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropChance {
    pub kind: PowerupKind,
    /// Probability in [0, 1]
    pub chance: f64,
}

const fn odds(kind: PowerupKind, chance: f64) -> DropChance {
    DropChance { kind, chance }
}

/// Balance for a single level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTuning {
    /// Destructible walls scattered over free floor
    pub destructible_walls: usize,
    /// Level clock in seconds
    pub timer_secs: u32,
    pub wanderers: usize,
    pub flyers: usize,
    /// Powerups always hidden under some wall
    pub guaranteed: Vec<PowerupKind>,
    /// Extra powerups, each rolled independently in order
    pub chances: Vec<DropChance>,
    /// Experience for clearing the level
    pub clear_exp: u64,
}

/// Whole-campaign balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub levels: Vec<LevelTuning>,
}

impl Default for Tuning {
    fn default() -> Self {
        use PowerupKind::*;
        Self {
            levels: vec![
                LevelTuning {
                    destructible_walls: 35,
                    timer_secs: 200,
                    wanderers: 2,
                    flyers: 1,
                    guaranteed: vec![Radius, Score, Life, Bomb],
                    chances: vec![
                        odds(Score, 0.90),
                        odds(Speed, 0.30),
                        odds(Life, 0.60),
                        odds(Radius, 0.10),
                        odds(Invincibility, 0.25),
                    ],
                    clear_exp: 100,
                },
                LevelTuning {
                    destructible_walls: 40,
                    timer_secs: 170,
                    wanderers: 4,
                    flyers: 1,
                    guaranteed: vec![Radius, Life, Score, Score],
                    chances: vec![
                        odds(Score, 0.50),
                        odds(Life, 0.70),
                        odds(Invincibility, 0.25),
                        odds(Bomb, 0.25),
                        odds(Bomb, 0.10),
                        odds(Speed, 0.25),
                        odds(Radius, 0.10),
                    ],
                    clear_exp: 150,
                },
                LevelTuning {
                    destructible_walls: 50,
                    timer_secs: 150,
                    wanderers: 4,
                    flyers: 2,
                    guaranteed: vec![Life, Life, Score, Score],
                    chances: vec![
                        odds(Life, 0.50),
                        odds(Invincibility, 0.30),
                        odds(Speed, 0.25),
                        odds(Invincibility, 0.30),
                        odds(Bomb, 0.10),
                        odds(Radius, 0.05),
                        odds(Score, 0.15),
                    ],
                    clear_exp: 300,
                },
            ],
        }
    }
}

impl Tuning {
    /// Balance for a 1-based level number
    pub fn level(&self, level: u32) -> Option<&LevelTuning> {
        (level as usize)
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
    }

    pub fn final_level(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Load from a JSON file, falling back to defaults on any problem
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Tuning>(&json) {
                Ok(tuning) if !tuning.levels.is_empty() => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Ok(_) => {
                    log::warn!("Tuning file {} has no levels, using defaults", path.display());
                    Self::default()
                }
                Err(e) => {
                    log::warn!("Invalid tuning file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No tuning at {} ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_campaign() {
        let tuning = Tuning::default();
        assert_eq!(tuning.final_level(), 3);
        assert_eq!(tuning.level(0), None);
        assert_eq!(tuning.level(1).map(|l| l.destructible_walls), Some(35));
        assert_eq!(tuning.level(3).map(|l| (l.wanderers, l.flyers)), Some((4, 2)));
        assert_eq!(tuning.level(4), None);
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = Tuning::default();
        let json = serde_json::to_string(&tuning).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tuning);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("bomb_arena_no_such_tuning.json");
        assert_eq!(Tuning::load_or_default(&path), Tuning::default());
    }
}
