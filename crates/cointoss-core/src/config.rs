//! Configuration loading and typed config structures for the coin-toss
//! economy.
//!
//! The configuration lives in `cointoss-config.yaml` in the working
//! directory. This module defines strongly-typed structs that mirror the
//! YAML structure, and a loader that reads the file and applies
//! environment overrides. Every field has a default, so an empty file (or
//! no file at all) yields a runnable configuration.

use std::path::Path;

use serde::Deserialize;

use crate::params::{GameError, parse_integer_input};
use crate::select::{DEFAULT_MAX_ATTEMPTS, SelectionStrategy};

/// Environment variable overriding `game.player_count`.
pub const ENV_PLAYERS: &str = "COINTOSS_PLAYERS";
/// Environment variable overriding `game.initial_balance`.
pub const ENV_BALANCE: &str = "COINTOSS_BALANCE";
/// Environment variable overriding `game.seed`.
pub const ENV_SEED: &str = "COINTOSS_SEED";
/// Environment variable overriding `run.max_turns`.
pub const ENV_MAX_TURNS: &str = "COINTOSS_MAX_TURNS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value in {var}: {source}")]
    Override {
        /// The environment variable name.
        var: &'static str,
        /// The validation error.
        source: GameError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Game inputs (players, starting balance, seed).
    #[serde(default)]
    pub game: GameConfig,

    /// Run bounds and engine options.
    #[serde(default)]
    pub run: RunConfig,

    /// How the driver prints snapshots.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path and apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Override`] if an environment override is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string (no environment overrides).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// - `COINTOSS_PLAYERS` overrides `game.player_count`
    /// - `COINTOSS_BALANCE` overrides `game.initial_balance`
    /// - `COINTOSS_SEED` overrides `game.seed`
    /// - `COINTOSS_MAX_TURNS` overrides `run.max_turns`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Override`] if a set variable does not hold a
    /// valid integer.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// As [`SimulationConfig::apply_env_overrides`].
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PLAYERS) {
            self.game.player_count = parse_override(ENV_PLAYERS, "player_count", &raw)?;
        }
        if let Some(raw) = lookup(ENV_BALANCE) {
            self.game.initial_balance = parse_override(ENV_BALANCE, "initial_balance", &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            let seed = parse_override(ENV_SEED, "seed", &raw)?;
            self.game.seed = Some(non_negative(ENV_SEED, "seed", seed)?);
        }
        if let Some(raw) = lookup(ENV_MAX_TURNS) {
            let max_turns = parse_override(ENV_MAX_TURNS, "max_turns", &raw)?;
            self.run.max_turns = non_negative(ENV_MAX_TURNS, "max_turns", max_turns)?;
        }
        Ok(())
    }
}

fn parse_override(var: &'static str, name: &'static str, raw: &str) -> Result<i64, ConfigError> {
    parse_integer_input(name, raw).map_err(|source| ConfigError::Override { var, source })
}

fn non_negative(var: &'static str, name: &'static str, value: i64) -> Result<u64, ConfigError> {
    u64::try_from(value).map_err(|_err| ConfigError::Override {
        var,
        source: GameError::InvalidArgument {
            name,
            reason: format!("must not be negative, got {value}"),
        },
    })
}

/// Game inputs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Number of players.
    #[serde(default = "default_player_count")]
    pub player_count: i64,

    /// Starting balance of every player.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: i64,

    /// Random seed for reproducibility (`None` = seed from the OS).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: default_player_count(),
            initial_balance: default_initial_balance(),
            seed: None,
        }
    }
}

/// Run bounds and engine options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Maximum turns before the run is halted (0 = unlimited).
    #[serde(default)]
    pub max_turns: u64,

    /// Player selection strategy.
    #[serde(default)]
    pub selection: SelectionStrategy,

    /// Per-draw attempt cap for the rejection strategy.
    #[serde(default = "default_max_selection_attempts")]
    pub max_selection_attempts: u32,

    /// Whether to verify the conservation law after every turn.
    #[serde(default = "default_true")]
    pub verify_conservation: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: 0,
            selection: SelectionStrategy::default(),
            max_selection_attempts: default_max_selection_attempts(),
            verify_conservation: true,
        }
    }
}

/// Output configuration for the driver binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// 0 streams every snapshot; N > 0 prints only the last N lines.
    #[serde(default)]
    pub tail: usize,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_player_count() -> i64 {
    10
}

const fn default_initial_balance() -> i64 {
    10
}

const fn default_max_selection_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.game.player_count, 10);
        assert_eq!(config.game.initial_balance, 10);
        assert_eq!(config.game.seed, None);
        assert_eq!(config.run.max_turns, 0);
        assert_eq!(config.run.selection, SelectionStrategy::Indexed);
        assert!(config.run.verify_conservation);
        assert_eq!(config.output.tail, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
game:
  player_count: 4
  initial_balance: 25
  seed: 99

run:
  max_turns: 5000
  selection: rejection
  max_selection_attempts: 64
  verify_conservation: false

output:
  tail: 10

logging:
  level: "debug"
  format: json
"#;
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.game.player_count, 4);
        assert_eq!(config.game.initial_balance, 25);
        assert_eq!(config.game.seed, Some(99));
        assert_eq!(config.run.max_turns, 5000);
        assert_eq!(config.run.selection, SelectionStrategy::Rejection);
        assert_eq!(config.run.max_selection_attempts, 64);
        assert!(!config.run.verify_conservation);
        assert_eq!(config.output.tail, 10);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("game:\n  player_count: 3\n").unwrap();
        assert_eq!(config.game.player_count, 3);
        // Everything else uses defaults
        assert_eq!(config.game.initial_balance, 10);
        assert_eq!(config.run, RunConfig::default());
    }

    #[test]
    fn parse_empty_yaml() {
        assert_eq!(SimulationConfig::parse("").unwrap(), SimulationConfig::default());
    }

    #[test]
    fn fractional_player_count_is_rejected() {
        let result = SimulationConfig::parse("game:\n  player_count: 3.5\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let result = SimulationConfig::parse("run:\n  selection: psychic\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = SimulationConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_PLAYERS, "2"),
                (ENV_BALANCE, "5"),
                (ENV_SEED, "1234"),
                (ENV_MAX_TURNS, "100"),
            ]))
            .unwrap();
        assert_eq!(config.game.player_count, 2);
        assert_eq!(config.game.initial_balance, 5);
        assert_eq!(config.game.seed, Some(1234));
        assert_eq!(config.run.max_turns, 100);
    }

    #[test]
    fn absent_overrides_leave_config_alone() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(lookup(&[])).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let mut config = SimulationConfig::default();
        let err = config.apply_overrides(lookup(&[(ENV_PLAYERS, "2.5")])).err();
        assert!(matches!(err, Some(ConfigError::Override { var: ENV_PLAYERS, .. })));

        let err = config.apply_overrides(lookup(&[(ENV_SEED, "-1")])).err();
        assert!(matches!(err, Some(ConfigError::Override { var: ENV_SEED, .. })));

        let err = config.apply_overrides(lookup(&[(ENV_BALANCE, "NaN")])).err();
        assert!(matches!(err, Some(ConfigError::Override { var: ENV_BALANCE, .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("cointoss-config.yaml");
        if path.exists() {
            let config = SimulationConfig::parse(&std::fs::read_to_string(&path).unwrap());
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
