//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level game configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scene flow timing and transition rules.
    pub flow: FlowConfig,
    /// Antenna puzzle tuning.
    pub puzzle: PuzzleConfig,
    /// House scene settings.
    pub house: HouseConfig,
    /// Audio settings.
    pub audio: AudioConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Scene flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
    /// Pause between the end of the cutscene and the swap into the house.
    pub settle_delay_ms: u64,
    /// How long a single load stage may stay unanswered before the
    /// transition is abandoned.
    pub load_timeout_ms: u64,
    /// Start loading the house while the cutscene is playing.
    pub preload_main_scene: bool,
    /// Allow going back to Mars once it has been visited.
    pub allow_mars_revisit: bool,
    /// Worker threads used by the asset loading pipeline.
    pub loader_threads: usize,
}

/// What happens to the antenna puzzle when Mars is entered again.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PuzzleRevisit {
    /// Rebuild the puzzle from scratch on every visit.
    #[default]
    Replay,
    /// Start later visits with every antenna active and the gate open.
    Skip,
}

/// Antenna puzzle configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PuzzleConfig {
    /// Distance (world units) under which an antenna counts as in range.
    pub proximity_threshold: f32,
    /// How long the "wrong order" message stays on screen.
    pub wrong_order_message_ms: u64,
    /// Station indices in the order they must be activated.
    pub required_order: Vec<usize>,
    /// Behavior on a second trip to Mars.
    pub revisit: PuzzleRevisit,
    /// Ambient light intensity once the gate opens.
    pub ambient_boost: f32,
    /// Directional light intensity once the gate opens.
    pub directional_boost: f32,
}

/// House scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HouseConfig {
    /// Fade-in duration of the journal after returning from Mars.
    pub book_fade_ms: u64,
    /// Key that jumps straight to Mars (subject to the usual flow rules).
    pub mars_shortcut_key: String,
}

/// Audio configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Master volume (0.0 - 1.0).
    pub master_volume: f32,
    /// Music and ambience volume (0.0 - 1.0).
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0).
    pub sfx_volume: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Treat a missing door, switch, antenna or gate as a load failure
    /// instead of a warning.
    pub strict_world_objects: bool,
}

// --- Default implementations ---

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            load_timeout_ms: 10_000,
            preload_main_scene: true,
            allow_mars_revisit: false,
            loader_threads: 1,
        }
    }
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 1.5,
            wrong_order_message_ms: 3000,
            required_order: vec![0, 1, 2, 3, 4],
            revisit: PuzzleRevisit::Replay,
            ambient_boost: 1.0,
            directional_boost: 2.0,
        }
    }
}

impl Default for HouseConfig {
    fn default() -> Self {
        Self {
            book_fade_ms: 1500,
            mars_shortcut_key: "KeyM".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_volume: 0.7,
            sfx_volume: 1.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            strict_world_objects: false,
        }
    }
}

/// Platform config directory for the game, e.g. `~/.config/framed-dreams`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("framed-dreams"))
}

// --- Validation ---

impl Config {
    /// Reject values that deserialize fine but would break the game rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let order = &self.puzzle.required_order;
        if order.is_empty() {
            return Err(ConfigError::Invalid {
                field: "puzzle.required_order",
                reason: "at least one station is required".to_string(),
            });
        }
        let mut seen = vec![false; order.len()];
        for &station in order {
            match seen.get_mut(station) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(ConfigError::Invalid {
                        field: "puzzle.required_order",
                        reason: format!("{order:?} is not a permutation of 0..{}", order.len()),
                    });
                }
            }
        }

        if !(self.puzzle.proximity_threshold > 0.0) {
            return Err(ConfigError::Invalid {
                field: "puzzle.proximity_threshold",
                reason: format!("must be positive, got {}", self.puzzle.proximity_threshold),
            });
        }

        if self.flow.load_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "flow.load_timeout_ms",
                reason: "a zero timeout fails every stage load".to_string(),
            });
        }

        if self.flow.loader_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "flow.loader_threads",
                reason: "at least one loader thread is required".to_string(),
            });
        }

        Ok(())
    }
}

// --- Load / Save / Reload ---

/// File name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.ron";

impl Config {
    /// Read and validate `config.ron` from `config_dir`.
    fn read_from(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        let text = std::fs::read_to_string(&path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&text).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config in `config_dir`, writing the defaults there first if
    /// there is none yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }
        let config = Self::read_from(config_dir)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config to `config_dir` as pretty-printed RON.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;
        std::fs::write(config_dir.join(CONFIG_FILE_NAME), text).map_err(ConfigError::WriteError)
    }

    /// Re-read the file. Returns `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read_from(config_dir)?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Config changed on disk, reloading");
        Ok(Some(fresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("settle_delay_ms: 500"));
        assert!(ron_str.contains("wrong_order_message_ms: 3000"));
        assert!(ron_str.contains("revisit: Replay"));
    }

    #[test]
    fn test_defaults_match_observed_tuning() {
        let config = Config::default();
        assert_eq!(config.flow.settle_delay_ms, 500);
        assert!((config.puzzle.proximity_threshold - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.puzzle.required_order, vec![0, 1, 2, 3, 4]);
        assert!(!config.debug.strict_world_objects);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(flow: (settle_delay_ms: 250))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.flow.settle_delay_ms, 250);
        assert_eq!(config.flow.load_timeout_ms, 10_000);
        assert_eq!(config.puzzle, PuzzleConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_revisit_skip_parses() {
        let config: Config = ron::from_str("(puzzle: (revisit: Skip))").unwrap();
        assert_eq!(config.puzzle.revisit, PuzzleRevisit::Skip);
    }

    #[test]
    fn test_duplicate_station_in_order_rejected() {
        let mut config = Config::default();
        config.puzzle.required_order = vec![0, 1, 1, 3, 4];
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "puzzle.required_order",
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_bounds_station_in_order_rejected() {
        let mut config = Config::default();
        config.puzzle.required_order = vec![0, 1, 7];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_order_rejected() {
        let mut config = Config::default();
        config.puzzle.required_order = vec![];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "puzzle.required_order",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_load_timeout_rejected() {
        let mut config = Config::default();
        config.flow.load_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "flow.load_timeout_ms",
                ..
            })
        ));
        config.flow.load_timeout_ms = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shuffled_order_is_valid() {
        let mut config = Config::default();
        config.puzzle.required_order = vec![3, 0, 4, 1, 2];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_threshold_rejected() {
        let mut config = Config::default();
        config.puzzle.proximity_threshold = 0.0;
        assert!(config.validate().is_err());
        config.puzzle.proximity_threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.flow.allow_mars_revisit = true;
        config.puzzle.required_order = vec![4, 3, 2, 1, 0];

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.house.book_fade_ms = 900;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().house.book_fade_ms, 900);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_rejects_invalid_order_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.ron"),
            "(puzzle: (required_order: [0, 0, 1]))",
        )
        .unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
