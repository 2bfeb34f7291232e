//! Validated game inputs.
//!
//! The engine takes a player count and a starting balance. Both arrive as
//! integers from typed callers, but the presentation layer (config file,
//! environment, command line) may hand over strings or floating-point
//! values. Everything funnels through [`GameParams`], which rejects
//! anything that is not a usable integer instead of coercing it.

use crate::config::GameConfig;

/// 2^63, exactly representable as `f64`. Bounds the `i64` range.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Errors raised while validating game inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// An input is out of range, non-integer, or non-finite.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending input.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl GameError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Player count and starting balance for one run.
///
/// `player_count` is at least 1 and `player_count * initial_balance` fits in
/// an `i64`. `initial_balance` may be zero or negative; such runs end after
/// zero turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameParams {
    player_count: usize,
    initial_balance: i64,
}

impl GameParams {
    /// Validate integer inputs.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidArgument`] if `player_count` is not
    /// positive, does not fit in `usize`, or the total wealth overflows.
    pub fn new(player_count: i64, initial_balance: i64) -> Result<Self, GameError> {
        if player_count <= 0 {
            return Err(GameError::invalid(
                "player_count",
                format!("must be positive, got {player_count}"),
            ));
        }
        let count = usize::try_from(player_count).map_err(|_err| {
            GameError::invalid("player_count", format!("{player_count} exceeds platform range"))
        })?;
        if player_count.checked_mul(initial_balance).is_none() {
            return Err(GameError::invalid(
                "initial_balance",
                format!("{player_count} players x {initial_balance} overflows total wealth"),
            ));
        }
        Ok(Self {
            player_count: count,
            initial_balance,
        })
    }

    /// Validate floating-point inputs, as handed over by a loosely typed
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidArgument`] if either value is NaN,
    /// infinite, has a fractional part, or is outside the `i64` range, and
    /// otherwise as [`GameParams::new`].
    pub fn from_f64(player_count: f64, initial_balance: f64) -> Result<Self, GameError> {
        let player_count = integer_from_f64("player_count", player_count)?;
        let initial_balance = integer_from_f64("initial_balance", initial_balance)?;
        Self::new(player_count, initial_balance)
    }

    /// Validate string inputs.
    ///
    /// # Errors
    ///
    /// As [`parse_integer_input`] and [`GameParams::new`].
    pub fn parse(player_count: &str, initial_balance: &str) -> Result<Self, GameError> {
        let player_count = parse_integer_input("player_count", player_count)?;
        let initial_balance = parse_integer_input("initial_balance", initial_balance)?;
        Self::new(player_count, initial_balance)
    }

    /// Build from the `game` section of the configuration.
    ///
    /// # Errors
    ///
    /// As [`GameParams::new`].
    pub fn from_config(config: &GameConfig) -> Result<Self, GameError> {
        Self::new(config.player_count, config.initial_balance)
    }

    /// Number of players.
    pub const fn player_count(&self) -> usize {
        self.player_count
    }

    /// Starting balance of every player.
    pub const fn initial_balance(&self) -> i64 {
        self.initial_balance
    }
}

/// Parse a raw textual input as an integer.
///
/// Plain integers are accepted directly. Numeric strings in floating-point
/// form (`"12.0"`, `"1e3"`) are accepted only when they denote a finite
/// integral value; `"3.5"`, `"NaN"`, `"inf"`, and empty strings are rejected.
///
/// # Errors
///
/// Returns [`GameError::InvalidArgument`] naming `name`.
pub fn parse_integer_input(name: &'static str, raw: &str) -> Result<i64, GameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GameError::invalid(name, "value is empty"));
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) => integer_from_f64(name, value),
        Err(_err) => Err(GameError::invalid(
            name,
            format!("`{trimmed}` is not a number"),
        )),
    }
}

#[allow(clippy::cast_possible_truncation)] // range and fraction checked above the cast
fn integer_from_f64(name: &'static str, value: f64) -> Result<i64, GameError> {
    if !value.is_finite() {
        return Err(GameError::invalid(name, format!("{value} is not finite")));
    }
    if value.fract().abs() > 0.0 {
        return Err(GameError::invalid(name, format!("{value} is not an integer")));
    }
    if value < -TWO_POW_63 || value >= TWO_POW_63 {
        return Err(GameError::invalid(name, format!("{value} is outside the i64 range")));
    }
    Ok(value as i64)
}
