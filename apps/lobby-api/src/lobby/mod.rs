//! In-memory lobby/session state machine with timed auto-transitions.

pub mod characters;
pub mod delay;
pub mod error;
pub mod manager;
pub mod model;
pub mod scheduler;

pub use error::LobbyError;
pub use manager::{CreateSession, CreatedSession, GmInfo, LobbyManager};
pub use model::{Player, PlayerType, Role, SessionStatus, SessionView};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
