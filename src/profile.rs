//! Player profile persistence
//!
//! One comma-separated record per line:
//! `username,avatar,played,won,lost,total_score,level,exp,exp_next`.
//! The whole file is rewritten on every update.

use std::path::{Path, PathBuf};

use crate::error::ProfileError;
use crate::sim::events::MatchOutcome;

const FIELDS: usize = 9;
/// Experience needed to leave level 1
const FIRST_LEVEL_EXP: u64 = 500;
/// Threshold growth per profile level
const EXP_PER_LEVEL: u64 = 750;

/// Lifetime statistics of one player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub username: String,
    pub avatar: String,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub total_score: u64,
    pub level: u32,
    pub exp: u64,
    pub exp_next: u64,
}

impl PlayerProfile {
    pub fn new(username: &str, avatar: &str) -> Result<Self, ProfileError> {
        for field in [username, avatar] {
            if field.is_empty() || field.contains([',', '\n', '\r']) {
                return Err(ProfileError::InvalidName(field.to_string()));
            }
        }
        Ok(Self {
            username: username.to_string(),
            avatar: avatar.to_string(),
            played: 0,
            won: 0,
            lost: 0,
            total_score: 0,
            level: 1,
            exp: 0,
            exp_next: FIRST_LEVEL_EXP,
        })
    }

    /// Credit a finished match
    pub fn apply_match(&mut self, outcome: MatchOutcome, score: u64, exp: u64) {
        self.played += 1;
        match outcome {
            MatchOutcome::Won => self.won += 1,
            MatchOutcome::Lost => self.lost += 1,
        }
        self.total_score += score;
        self.gain_exp(exp);
    }

    fn gain_exp(&mut self, exp: u64) {
        self.exp += exp;
        while self.exp_next > 0 && self.exp >= self.exp_next {
            self.exp -= self.exp_next;
            self.level += 1;
            self.exp_next = u64::from(self.level) * EXP_PER_LEVEL;
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.username,
            self.avatar,
            self.played,
            self.won,
            self.lost,
            self.total_score,
            self.level,
            self.exp,
            self.exp_next
        )
    }

    /// Parse one record; `line` is 1-based and only used for errors
    pub fn parse_line(text: &str, line: usize) -> Result<Self, ProfileError> {
        let fields: Vec<&str> = text.trim().split(',').collect();
        if fields.len() != FIELDS {
            return Err(ProfileError::FieldCount {
                line,
                expected: FIELDS,
                actual: fields.len(),
            });
        }

        fn num<T: std::str::FromStr>(
            value: &str,
            line: usize,
            field: &'static str,
        ) -> Result<T, ProfileError> {
            value.trim().parse().map_err(|_| ProfileError::BadNumber {
                line,
                field,
                value: value.to_string(),
            })
        }

        Ok(Self {
            username: fields[0].to_string(),
            avatar: fields[1].to_string(),
            played: num(fields[2], line, "played")?,
            won: num(fields[3], line, "won")?,
            lost: num(fields[4], line, "lost")?,
            total_score: num(fields[5], line, "total_score")?,
            level: num(fields[6], line, "level")?,
            exp: num(fields[7], line, "exp")?,
            exp_next: num(fields[8], line, "exp_next")?,
        })
    }
}

/// All profiles in one file
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<PlayerProfile>,
}

impl ProfileStore {
    /// Load every record; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No profiles at {}, starting empty", path.display());
                String::new()
            }
            Err(source) => {
                return Err(ProfileError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let profiles = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| PlayerProfile::parse_line(l, i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Loaded {} profiles", profiles.len());

        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    pub fn profiles(&self) -> &[PlayerProfile] {
        &self.profiles
    }

    pub fn get(&self, username: &str) -> Option<&PlayerProfile> {
        self.profiles.iter().find(|p| p.username == username)
    }

    /// Existing profile, or a fresh one appended to the store
    pub fn get_or_create(
        &mut self,
        username: &str,
        avatar: &str,
    ) -> Result<&mut PlayerProfile, ProfileError> {
        let index = match self.profiles.iter().position(|p| p.username == username) {
            Some(i) => i,
            None => {
                self.profiles.push(PlayerProfile::new(username, avatar)?);
                log::info!("Created profile {}", username);
                self.profiles.len() - 1
            }
        };
        Ok(&mut self.profiles[index])
    }

    /// Rewrite the whole file
    pub fn save(&self) -> Result<(), ProfileError> {
        let mut out = String::new();
        for profile in &self.profiles {
            out.push_str(&profile.to_line());
            out.push('\n');
        }
        std::fs::write(&self.path, out).map_err(|source| ProfileError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Credit a finished match to `username` and persist immediately
    pub fn record_match(
        &mut self,
        username: &str,
        avatar: &str,
        outcome: MatchOutcome,
        score: u64,
        exp: u64,
    ) -> Result<(), ProfileError> {
        self.get_or_create(username, avatar)?
            .apply_match(outcome, score, exp);
        self.save()?;
        log::info!("Recorded {:?} for {} ({} points)", outcome, username, score);
        Ok(())
    }
}
