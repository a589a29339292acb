//! Ошибки симуляции (typed, через thiserror)

use thiserror::Error;

use crate::flight::FlightState;

/// Ошибки flight FSM и внешних команд.
///
/// Ни одна из них не фатальна: системы логируют и продолжают тик.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlightError {
    #[error("illegal flight transition {from:?} -> {to:?}")]
    IllegalTransition { from: FlightState, to: FlightState },

    #[error("dragonfly has already departed")]
    Departed,

    #[error("command `{command}` rejected in state {state:?}")]
    CommandRejected {
        command: &'static str,
        state: FlightState,
    },
}

/// Ошибки загрузки/валидации FlightConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read flight config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse flight config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid flight config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
