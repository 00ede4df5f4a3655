//! Session and seat records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::scheduler::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Seats are filling; no countdown yet.
    Lobby,
    /// Character-selection countdown is running.
    SelectionOpen,
    /// Every seat holds a character; short pause before play.
    Starting,
    InProgress,
    Closed,
}

impl SessionStatus {
    /// Whether joins and character claims are still accepted.
    pub fn accepts_selection(self) -> bool {
        matches!(self, SessionStatus::Lobby | SessionStatus::SelectionOpen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    Human,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Gm,
    Player,
}

/// A single seat at the table.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Player {
    pub seat: usize,
    #[serde(rename = "type")]
    pub kind: PlayerType,
    /// Bound identity; `None` until someone joins a human seat.
    pub id: Option<String>,
    pub name: Option<String>,
    pub character: Option<String>,
    pub connected: bool,
    pub ready: bool,
    pub role: Role,
    pub selected_at: Option<DateTime<Utc>>,
}

impl Player {
    /// An unbound human seat.
    pub fn open_seat(seat: usize) -> Self {
        Self {
            seat,
            kind: PlayerType::Human,
            id: None,
            name: None,
            character: None,
            connected: true,
            ready: false,
            role: Role::Player,
            selected_at: None,
        }
    }

    /// An AI seat reserved at session setup.
    pub fn ai_seat(seat: usize) -> Self {
        let mut player = Self::open_seat(seat);
        player.kind = PlayerType::Ai;
        player.id = Some(format!("ai-{}", seat + 1));
        player.name = Some(format!("AI Player {}", seat + 1));
        player
    }

    /// Hand a human seat over to an AI replacement, dropping any claim.
    pub fn replace_with_ai(&mut self) {
        self.kind = PlayerType::Ai;
        self.id = Some(format!("ai-repl-{}", self.seat + 1));
        self.name = Some(format!("AI Player {}", self.seat + 1));
        self.character = None;
        self.selected_at = None;
        self.ready = false;
    }

    pub fn is_human(&self) -> bool {
        self.kind == PlayerType::Human
    }

    pub fn is_ai(&self) -> bool {
        self.kind == PlayerType::Ai
    }

    pub fn clear_claim(&mut self) {
        self.character = None;
        self.selected_at = None;
        self.ready = false;
    }
}

/// One game lobby instance. Owned by the `LobbyManager`; callers only ever
/// see `SessionView` snapshots.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub selection_ends_at: Option<DateTime<Utc>>,
    pub players: Vec<Player>,
    /// The GM's reserved slot. Its seat index is one past the last player seat.
    pub gm: Player,
    /// Every character this session was created with, in pool order.
    pub character_pool: Vec<String>,
    /// Bumped on reset/reopen so timers armed in an earlier phase can tell
    /// they are stale.
    pub(crate) epoch: u64,
    pub(crate) timers: HashSet<TimerId>,
    pub(crate) gm_token_hash: String,
}

impl Session {
    /// Seat index of the claimant of `character`, if any.
    pub fn claimant_of(&self, character: &str) -> Option<usize> {
        self.players
            .iter()
            .find(|p| p.character.as_deref() == Some(character))
            .map(|p| p.seat)
    }

    pub fn is_claimed(&self, character: &str) -> bool {
        self.claimant_of(character).is_some()
    }

    /// Pool characters nobody holds yet, in pool order.
    pub fn available_characters(&self) -> Vec<String> {
        self.character_pool
            .iter()
            .filter(|c| !self.is_claimed(c))
            .cloned()
            .collect()
    }

    pub fn all_claimed(&self) -> bool {
        self.players.iter().all(|p| p.character.is_some())
    }

    pub fn gm_seat(&self) -> usize {
        self.players.len()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            selection_ends_at: self.selection_ends_at,
            players: self.players.clone(),
            gm: self.gm.clone(),
            available_characters: self.available_characters(),
        }
    }
}

/// Read-only snapshot of a session, safe to hand to any client.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionView {
    pub id: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub selection_ends_at: Option<DateTime<Utc>>,
    pub players: Vec<Player>,
    pub gm: Player,
    pub available_characters: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(players: Vec<Player>, pool: &[&str]) -> Session {
        let now = Utc::now();
        let gm_seat = players.len();
        let mut gm = Player::open_seat(gm_seat);
        gm.role = Role::Gm;
        Session {
            id: "ASH-TEST".to_string(),
            status: SessionStatus::Lobby,
            created_at: now,
            updated_at: now,
            selection_ends_at: None,
            players,
            gm,
            character_pool: pool.iter().map(|s| s.to_string()).collect(),
            epoch: 0,
            timers: HashSet::new(),
            gm_token_hash: String::new(),
        }
    }

    #[test]
    fn available_characters_excludes_claims_and_keeps_pool_order() {
        let mut a = Player::open_seat(0);
        a.character = Some("b".to_string());
        let session = session_with(vec![a, Player::open_seat(1)], &["a", "b", "c"]);
        assert_eq!(session.available_characters(), vec!["a", "c"]);
        assert_eq!(session.claimant_of("b"), Some(0));
        assert!(!session.all_claimed());
    }

    #[test]
    fn replace_with_ai_drops_claim_and_renames() {
        let mut p = Player::open_seat(2);
        p.id = Some("usr_1".to_string());
        p.character = Some("ravenkeeper".to_string());
        p.selected_at = Some(Utc::now());
        p.ready = true;

        p.replace_with_ai();

        assert!(p.is_ai());
        assert_eq!(p.id.as_deref(), Some("ai-repl-3"));
        assert_eq!(p.name.as_deref(), Some("AI Player 3"));
        assert!(p.character.is_none());
        assert!(p.selected_at.is_none());
        assert!(!p.ready);
        assert_eq!(p.role, Role::Player);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::SelectionOpen).unwrap();
        assert_eq!(json, "\"selection_open\"");
        let json = serde_json::to_value(Player::ai_seat(0)).unwrap();
        assert_eq!(json["type"], "ai");
        assert_eq!(json["role"], "player");
    }
}
