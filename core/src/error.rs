use alloc::string::String;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Cell index {0} is outside the grid")]
    InvalidIndex(u8),
    #[error("Expected 9 images, only {0} available")]
    NotEnoughImages(usize),
    #[error("Attempt text is empty")]
    EmptyAttempt,
    #[error("Attempts are not accepted right now")]
    NotAccepting,
    #[error("No chances left")]
    NoChancesLeft,
    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failure reported by one of the remote collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service unreachable: {0}")]
    Unreachable(String),
    #[error("Service responded with status {0}")]
    Status(u16),
    #[error("Malformed service response: {0}")]
    Malformed(String),
}
