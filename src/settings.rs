//! Game settings and preferences
//!
//! Persisted as a JSON file next to the player profiles.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Player ===
    /// Profile the results of each match are credited to
    pub player_name: String,
    /// Avatar skin recorded in a freshly created profile
    pub player_avatar: String,

    // === Files ===
    /// Profile record file
    pub profile_path: PathBuf,
    /// Where generated level layouts are written before loading.
    /// `None` keeps layouts in memory.
    pub map_path: Option<PathBuf>,
    /// Optional level balance override
    pub tuning_path: Option<PathBuf>,

    /// Fixed RNG seed; `None` seeds from the clock
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Audio
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            // Player
            player_name: "player".to_string(),
            player_avatar: "classic".to_string(),

            // Files
            profile_path: PathBuf::from("profiles.txt"),
            map_path: Some(PathBuf::from("map.txt")),
            tuning_path: None,

            seed: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Configured seed, or one derived from the system clock
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            muted: true,
            player_name: "ada".to_string(),
            seed: Some(42),
            map_path: None,
            ..Default::default()
        };
        let path = std::env::temp_dir().join(format!(
            "bomb_arena_settings_{}.json",
            std::process::id()
        ));
        settings.save(&path).unwrap();
        let back = Settings::load_or_default(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"sfx_volume": 0.25}"#).unwrap();
        assert_eq!(settings.sfx_volume, 0.25);
        assert_eq!(settings.master_volume, 0.8);
        assert_eq!(settings.player_name, "player");
    }

    #[test]
    fn test_missing_or_broken_file_uses_defaults() {
        let missing = std::env::temp_dir().join("bomb_arena_no_such_settings.json");
        assert_eq!(Settings::load_or_default(&missing), Settings::default());

        let broken = std::env::temp_dir().join(format!(
            "bomb_arena_broken_settings_{}.json",
            std::process::id()
        ));
        std::fs::write(&broken, "{ not json").unwrap();
        let loaded = Settings::load_or_default(&broken);
        let _ = std::fs::remove_file(&broken);
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_fixed_seed_is_used() {
        let settings = Settings {
            seed: Some(7),
            ..Default::default()
        };
        assert_eq!(settings.resolve_seed(), 7);
    }
}
