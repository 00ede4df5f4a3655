use thiserror::Error;

/// Every way a lobby operation can be refused.
///
/// Timer-driven transitions never produce these: a timer that finds its
/// session gone or moved on simply does nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("session not found")]
    SessionNotFound,
    #[error("seat {0} not found")]
    SeatNotFound(usize),
    #[error("character '{0}' is not in this session's pool")]
    CharacterNotFound(String),
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("invalid state: {message}")]
    InvalidState { message: String },
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("GM authorization failed")]
    Unauthorized,
    #[error("no free session code; try again later")]
    CodesExhausted,
}

impl LobbyError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
