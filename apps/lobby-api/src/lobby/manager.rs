//! The session store and every lobby mutation.
//!
//! Each session lives behind its own `parking_lot::Mutex`, so operations on
//! one session run to completion one at a time while different sessions
//! proceed independently. Timer callbacks go through the same lock and
//! re-check the session before acting: a callback that finds the session
//! removed, reset (epoch changed) or already advanced does nothing.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use ashwood_common::code::{opaque_secret, session_code};
use ashwood_common::id::prefix;

use super::characters::{self, default_pool};
use super::delay::TriangularDelay;
use super::error::LobbyError;
use super::model::{Player, PlayerType, Role, Session, SessionStatus, SessionView};
use super::scheduler::{Scheduler, TimerId};

/// Largest table the lobby will seat.
pub const MAX_SEATS: usize = 16;

/// Longest selection countdown or start delay accepted from configuration.
pub const MAX_PHASE_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Fresh codes tried before `create_session` gives up.
const CODE_ATTEMPTS: usize = 32;

/// Upper bound on the gap between idle sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Timing and defaults for the lobby.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    pub selection_window: Duration,
    pub start_delay: Duration,
    pub ai_delay: TriangularDelay,
    pub default_seats: usize,
    pub characters: Vec<String>,
    /// Sessions untouched for this long are dropped. `None` keeps them forever.
    pub idle_ttl: Option<Duration>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            selection_window: Duration::from_millis(20_000),
            start_delay: Duration::from_millis(2_000),
            ai_delay: TriangularDelay::default(),
            default_seats: 4,
            characters: default_pool(),
            idle_ttl: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl LobbyConfig {
    /// Reject settings that would make every session unusable.
    pub fn validate(&self) -> Result<(), LobbyError> {
        if !(1..=MAX_SEATS).contains(&self.default_seats) {
            return Err(LobbyError::invalid_argument(format!(
                "default seats must be between 1 and {MAX_SEATS}"
            )));
        }
        if self.selection_window > MAX_PHASE_DELAY || self.start_delay > MAX_PHASE_DELAY {
            return Err(LobbyError::invalid_argument(
                "selection window and start delay must be at most 24h",
            ));
        }
        if self.idle_ttl == Some(Duration::ZERO) {
            return Err(LobbyError::invalid_argument("idle ttl must be positive"));
        }
        characters::validate_pool(&self.characters).map_err(LobbyError::invalid_argument)
    }
}

/// Who runs the table. Missing fields get `gm-1` / `GM` / human.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GmInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<PlayerType>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateSession {
    pub seats: Option<usize>,
    #[serde(default)]
    pub gm: GmInfo,
    /// Seats reserved for AI players from the start.
    #[serde(default)]
    pub ai_seats: Vec<usize>,
    /// Overrides the configured character pool.
    pub characters: Option<Vec<String>>,
}

/// Result of `create_session`. The token is only ever returned here.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session: SessionView,
    pub gm_token: String,
}

/// Which mechanism is filling an empty claim; decides placeholder prefixes.
#[derive(Debug, Clone, Copy)]
enum AutoPick {
    Countdown,
    Ai,
}

impl AutoPick {
    fn placeholder_prefix(self) -> &'static str {
        match self {
            AutoPick::Countdown => "auto",
            AutoPick::Ai => "ai",
        }
    }
}

struct Inner {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    scheduler: Arc<dyn Scheduler>,
    config: LobbyConfig,
    codes: fn() -> String,
    sweeper: Mutex<Option<TimerId>>,
}

/// Owns every live session and the timers acting on them.
#[derive(Clone)]
pub struct LobbyManager {
    inner: Arc<Inner>,
}

/// `now + window`, saturating instead of overflowing.
fn deadline_after(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl LobbyManager {
    pub fn new(config: LobbyConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_codes(config, scheduler, session_code)
    }

    /// Like [`LobbyManager::new`] with a custom session-code source.
    pub(crate) fn with_codes(
        config: LobbyConfig,
        scheduler: Arc<dyn Scheduler>,
        codes: fn() -> String,
    ) -> Self {
        let manager = Self {
            inner: Arc::new(Inner {
                sessions: DashMap::new(),
                scheduler,
                config,
                codes,
                sweeper: Mutex::new(None),
            }),
        };
        manager.schedule_sweep();
        manager
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    // -----------------------------------------------------------------------
    // Lookup helpers
    // -----------------------------------------------------------------------

    fn session(&self, session_id: &str) -> Result<Arc<Mutex<Session>>, LobbyError> {
        self.inner
            .sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or(LobbyError::SessionNotFound)
    }

    fn authorize_gm(session: &Session, gm_token: &str) -> Result<(), LobbyError> {
        if hash_token(gm_token) == session.gm_token_hash {
            Ok(())
        } else {
            Err(LobbyError::Unauthorized)
        }
    }

    fn require_selection_phase(session: &Session, action: &str) -> Result<(), LobbyError> {
        if session.status.accepts_selection() {
            Ok(())
        } else {
            Err(LobbyError::invalid_state(format!(
                "cannot {action} once the session is {:?}",
                session.status
            )))
        }
    }

    fn touch(&self, session: &mut Session) {
        session.updated_at = self.inner.scheduler.now();
    }

    /// Run a GM-only mutation: look up, authorize, mutate, stamp.
    fn with_gm_session<F>(
        &self,
        session_id: &str,
        gm_token: &str,
        f: F,
    ) -> Result<SessionView, LobbyError>
    where
        F: FnOnce(&Self, &mut Session) -> Result<(), LobbyError>,
    {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        Self::authorize_gm(&session, gm_token)?;
        f(self, &mut *session)?;
        self.touch(&mut session);
        Ok(session.view())
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn create_session(&self, req: CreateSession) -> Result<CreatedSession, LobbyError> {
        let seats = req.seats.unwrap_or(self.inner.config.default_seats);
        if seats < 1 {
            return Err(LobbyError::invalid_argument("seats must be at least 1"));
        }
        if seats > MAX_SEATS {
            return Err(LobbyError::invalid_argument(format!(
                "seats must be at most {MAX_SEATS}"
            )));
        }
        if let Some(&seat) = req.ai_seats.iter().find(|&&s| s >= seats) {
            return Err(LobbyError::invalid_argument(format!(
                "ai seat {seat} is out of range"
            )));
        }

        let character_pool = req
            .characters
            .unwrap_or_else(|| self.inner.config.characters.clone());
        characters::validate_pool(&character_pool).map_err(LobbyError::invalid_argument)?;

        let ai_seats: HashSet<usize> = req.ai_seats.into_iter().collect();
        let players = (0..seats)
            .map(|seat| {
                if ai_seats.contains(&seat) {
                    Player::ai_seat(seat)
                } else {
                    Player::open_seat(seat)
                }
            })
            .collect();

        let mut gm = Player::open_seat(seats);
        gm.role = Role::Gm;
        gm.kind = req.gm.kind.unwrap_or(PlayerType::Human);
        gm.id = Some(req.gm.id.unwrap_or_else(|| "gm-1".to_string()));
        gm.name = Some(req.gm.name.unwrap_or_else(|| "GM".to_string()));

        let gm_token = opaque_secret(prefix::GM_TOKEN, 32);
        let now = self.inner.scheduler.now();

        for _ in 0..CODE_ATTEMPTS {
            let code = (self.inner.codes)();
            match self.inner.sessions.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let session = Session {
                        id: code.clone(),
                        status: SessionStatus::Lobby,
                        created_at: now,
                        updated_at: now,
                        selection_ends_at: None,
                        players,
                        gm,
                        character_pool,
                        epoch: 0,
                        timers: HashSet::new(),
                        gm_token_hash: hash_token(&gm_token),
                    };
                    let view = session.view();
                    slot.insert(Arc::new(Mutex::new(session)));
                    tracing::info!(session = %code, seats, ai_seats = ai_seats.len(), "session created");
                    return Ok(CreatedSession {
                        session: view,
                        gm_token,
                    });
                }
            }
        }
        tracing::warn!(
            live = self.inner.sessions.len(),
            "no free session code after {CODE_ATTEMPTS} attempts"
        );
        Err(LobbyError::CodesExhausted)
    }

    pub fn get_state(&self, session_id: &str) -> Result<SessionView, LobbyError> {
        let handle = self.session(session_id)?;
        let session = handle.lock();
        Ok(session.view())
    }

    /// Bind a human identity to a seat. Re-joining with the same identity
    /// just marks the seat connected again.
    pub fn join_seat(
        &self,
        session_id: &str,
        seat: usize,
        user_id: Option<String>,
        name: Option<String>,
    ) -> Result<SessionView, LobbyError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();

        if seat == session.gm_seat() {
            return Err(LobbyError::conflict("seat is reserved for the GM"));
        }
        if seat > session.gm_seat() {
            return Err(LobbyError::SeatNotFound(seat));
        }
        Self::require_selection_phase(&session, "join")?;

        let player = &mut session.players[seat];
        if player.is_ai() {
            return Err(LobbyError::conflict("seat is reserved for an AI player"));
        }
        let user_id = user_id.unwrap_or_else(|| format!("user-{}", seat + 1));
        if let Some(existing) = player.id.as_deref() {
            if existing != user_id {
                return Err(LobbyError::conflict("seat is taken by another player"));
            }
        }

        player.id = Some(user_id);
        player.name = Some(name.unwrap_or_else(|| format!("Player {}", seat + 1)));
        player.connected = true;
        tracing::debug!(session = %session_id, seat, "seat joined");

        self.touch(&mut session);
        Ok(session.view())
    }

    pub fn set_ready(
        &self,
        session_id: &str,
        seat: usize,
        ready: bool,
    ) -> Result<SessionView, LobbyError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();

        let player = session
            .players
            .get(seat)
            .ok_or(LobbyError::SeatNotFound(seat))?;
        if player.is_ai() {
            return Err(LobbyError::conflict("seat is AI-controlled"));
        }
        if player.id.is_none() {
            return Err(LobbyError::invalid_state("seat has not been joined"));
        }
        Self::require_selection_phase(&session, "change readiness")?;

        session.players[seat].ready = ready;
        self.touch(&mut session);
        Ok(session.view())
    }

    /// Open the character-selection window. Calling again while it is open
    /// changes nothing.
    pub fn begin_selection_countdown(&self, session_id: &str) -> Result<SessionView, LobbyError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        Self::require_selection_phase(&session, "open selection")?;

        if session.status == SessionStatus::Lobby {
            self.open_selection(&mut session);
            self.touch(&mut session);
        }
        Ok(session.view())
    }

    pub fn select_character(
        &self,
        session_id: &str,
        seat: usize,
        character: &str,
    ) -> Result<SessionView, LobbyError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();

        Self::require_selection_phase(&session, "select a character")?;
        if seat == session.gm_seat() {
            return Err(LobbyError::invalid_argument(
                "the GM does not claim a character",
            ));
        }
        let player = session
            .players
            .get(seat)
            .ok_or(LobbyError::SeatNotFound(seat))?;
        if player.is_ai() {
            return Err(LobbyError::conflict("seat is AI-controlled"));
        }
        if !session.character_pool.iter().any(|c| c == character) {
            return Err(LobbyError::CharacterNotFound(character.to_string()));
        }
        match session.claimant_of(character) {
            Some(holder) if holder == seat => return Ok(session.view()),
            Some(_) => return Err(LobbyError::conflict("character already taken")),
            None => {}
        }

        if session.status == SessionStatus::Lobby {
            self.open_selection(&mut session);
        }

        let now = self.inner.scheduler.now();
        let player = &mut session.players[seat];
        player.character = Some(character.to_string());
        player.selected_at = Some(now);
        tracing::debug!(session = %session_id, seat, character, "character claimed");

        if session.all_claimed() {
            self.enter_starting(&mut session);
        }
        self.touch(&mut session);
        Ok(session.view())
    }

    /// GM override: fill every empty claim and start now.
    pub fn force_start(&self, session_id: &str, gm_token: &str) -> Result<SessionView, LobbyError> {
        self.with_gm_session(session_id, gm_token, |this, session| {
            Self::require_selection_phase(session, "force start")?;
            this.fill_missing(session, AutoPick::Countdown);
            this.enter_starting(session);
            tracing::info!(session = %session.id, "session force-started");
            Ok(())
        })
    }

    pub fn mark_disconnected(&self, session_id: &str, seat: usize) -> Result<SessionView, LobbyError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();

        if seat == session.gm_seat() {
            session.gm.connected = false;
            self.touch(&mut session);
            return Ok(session.view());
        }
        if seat > session.gm_seat() {
            return Err(LobbyError::SeatNotFound(seat));
        }

        session.players[seat].connected = false;
        if session.status.accepts_selection() && session.players[seat].is_human() {
            session.players[seat].replace_with_ai();
            tracing::info!(session = %session_id, seat, "disconnected seat handed to AI");
            if session.status == SessionStatus::SelectionOpen {
                self.schedule_ai_choice(&mut session, seat);
            }
        }
        self.touch(&mut session);
        Ok(session.view())
    }

    /// GM action: hand every human seat that has not claimed a character to
    /// an AI replacement.
    pub fn boot_inactive_humans(
        &self,
        session_id: &str,
        gm_token: &str,
    ) -> Result<SessionView, LobbyError> {
        self.with_gm_session(session_id, gm_token, |this, session| {
            Self::require_selection_phase(session, "boot inactive players")?;
            let booted: Vec<usize> = session
                .players
                .iter()
                .filter(|p| p.is_human() && p.character.is_none())
                .map(|p| p.seat)
                .collect();

            for &seat in &booted {
                let player = &mut session.players[seat];
                player.replace_with_ai();
                player.connected = true;
            }
            if session.status == SessionStatus::SelectionOpen {
                for &seat in &booted {
                    this.schedule_ai_choice(session, seat);
                }
            }
            tracing::info!(session = %session.id, booted = booted.len(), "inactive players booted");
            Ok(())
        })
    }

    /// GM action: back to an empty lobby with the same seats.
    pub fn reset_session(&self, session_id: &str, gm_token: &str) -> Result<SessionView, LobbyError> {
        self.with_gm_session(session_id, gm_token, |this, session| {
            if session.status == SessionStatus::Closed {
                return Err(LobbyError::invalid_state(
                    "session is closed; reopen it instead",
                ));
            }
            this.return_to_lobby(session);
            tracing::info!(session = %session.id, "session reset");
            Ok(())
        })
    }

    /// GM action: end a running game. The record stays readable.
    pub fn finish_session(&self, session_id: &str, gm_token: &str) -> Result<SessionView, LobbyError> {
        self.with_gm_session(session_id, gm_token, |this, session| {
            if session.status != SessionStatus::InProgress {
                return Err(LobbyError::invalid_state("no game is running"));
            }
            this.cancel_timers(session);
            session.status = SessionStatus::Closed;
            tracing::info!(session = %session.id, "session finished");
            Ok(())
        })
    }

    /// GM action: bring a finished session back to the lobby.
    pub fn reopen_session(&self, session_id: &str, gm_token: &str) -> Result<SessionView, LobbyError> {
        self.with_gm_session(session_id, gm_token, |this, session| {
            if session.status != SessionStatus::Closed {
                return Err(LobbyError::invalid_state("only closed sessions can be reopened"));
            }
            this.return_to_lobby(session);
            tracing::info!(session = %session.id, "session reopened");
            Ok(())
        })
    }

    /// GM action: cancel all timers and forget the session.
    pub fn close_session(&self, session_id: &str, gm_token: &str) -> Result<(), LobbyError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock();
        Self::authorize_gm(&session, gm_token)?;

        self.cancel_timers(&mut session);
        session.status = SessionStatus::Closed;
        self.inner.sessions.remove(session_id);
        tracing::info!(session = %session_id, "session closed");
        Ok(())
    }

    /// Cancel every timer and drop every session.
    pub fn shutdown(&self) {
        if let Some(timer) = self.inner.sweeper.lock().take() {
            self.inner.scheduler.cancel(timer);
        }
        let handles: Vec<_> = self
            .inner
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for handle in handles {
            let mut session = handle.lock();
            self.cancel_timers(&mut session);
            session.status = SessionStatus::Closed;
        }
        let count = self.inner.sessions.len();
        self.inner.sessions.clear();
        tracing::info!(sessions = count, "lobby shut down");
    }

    // -----------------------------------------------------------------------
    // Transitions (caller holds the session lock)
    // -----------------------------------------------------------------------

    fn open_selection(&self, session: &mut Session) {
        if session.selection_ends_at.is_some() {
            return;
        }
        let window = self.inner.config.selection_window;
        session.selection_ends_at = Some(deadline_after(self.inner.scheduler.now(), window));
        session.status = SessionStatus::SelectionOpen;

        let weak = Arc::downgrade(&self.inner);
        let (id, epoch) = (session.id.clone(), session.epoch);
        let timer = self.inner.scheduler.schedule(
            window,
            Box::new(move || {
                if let Some(manager) = Self::upgrade(&weak) {
                    manager.on_countdown_expired(&id, epoch);
                }
            }),
        );
        session.timers.insert(timer);
        tracing::info!(session = %session.id, window_ms = window.as_millis() as u64, "selection countdown started");

        let ai_seats: Vec<usize> = session
            .players
            .iter()
            .filter(|p| p.is_ai() && p.character.is_none())
            .map(|p| p.seat)
            .collect();
        for seat in ai_seats {
            self.schedule_ai_choice(session, seat);
        }
    }

    fn schedule_ai_choice(&self, session: &mut Session, seat: usize) {
        let delay = self.inner.config.ai_delay.sample(&mut rand::thread_rng());
        let weak = Arc::downgrade(&self.inner);
        let (id, epoch) = (session.id.clone(), session.epoch);
        let timer = self.inner.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(manager) = Self::upgrade(&weak) {
                    manager.on_ai_choice(&id, epoch, seat);
                }
            }),
        );
        session.timers.insert(timer);
        tracing::debug!(session = %session.id, seat, delay_ms = delay.as_millis() as u64, "AI choice scheduled");
    }

    /// Move to `starting` once per phase and arm the start delay.
    fn enter_starting(&self, session: &mut Session) {
        if !session.status.accepts_selection() {
            return;
        }
        // Countdown and pending AI picks have nothing left to do.
        self.cancel_timers(session);
        session.status = SessionStatus::Starting;

        let weak = Arc::downgrade(&self.inner);
        let (id, epoch) = (session.id.clone(), session.epoch);
        let timer = self.inner.scheduler.schedule(
            self.inner.config.start_delay,
            Box::new(move || {
                if let Some(manager) = Self::upgrade(&weak) {
                    manager.on_start_delay(&id, epoch);
                }
            }),
        );
        session.timers.insert(timer);
        tracing::info!(session = %session.id, "session starting");
    }

    /// Give every unclaimed seat a random free character.
    fn fill_missing(&self, session: &mut Session, pick: AutoPick) {
        let mut rng = rand::thread_rng();
        let mut pool = session.available_characters();
        let now = self.inner.scheduler.now();

        for seat in 0..session.players.len() {
            if session.players[seat].character.is_some() {
                continue;
            }
            let character = characters::draw(&mut pool, &mut rng)
                .unwrap_or_else(|| Self::placeholder_for(session, pick));
            let player = &mut session.players[seat];
            player.character = Some(character);
            player.selected_at = Some(now);
        }
    }

    fn placeholder_for(session: &Session, pick: AutoPick) -> String {
        characters::placeholder(pick.placeholder_prefix(), |c| {
            session.is_claimed(c) || session.character_pool.iter().any(|p| p == c)
        })
    }

    fn return_to_lobby(&self, session: &mut Session) {
        self.cancel_timers(session);
        session.epoch += 1;
        session.status = SessionStatus::Lobby;
        session.selection_ends_at = None;
        for player in &mut session.players {
            player.clear_claim();
        }
    }

    fn cancel_timers(&self, session: &mut Session) {
        for timer in session.timers.drain() {
            self.inner.scheduler.cancel(timer);
        }
    }

    // -----------------------------------------------------------------------
    // Idle eviction
    // -----------------------------------------------------------------------

    fn schedule_sweep(&self) {
        let Some(ttl) = self.inner.config.idle_ttl.filter(|t| !t.is_zero()) else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let timer = self.inner.scheduler.schedule(
            ttl.min(MAX_SWEEP_INTERVAL),
            Box::new(move || {
                if let Some(manager) = Self::upgrade(&weak) {
                    manager.sweep_idle();
                    manager.schedule_sweep();
                }
            }),
        );
        *self.inner.sweeper.lock() = Some(timer);
    }

    /// Drop every session whose last change is older than the idle ttl,
    /// cancelling its timers first.
    fn sweep_idle(&self) {
        let Some(ttl) = self.inner.config.idle_ttl else {
            return;
        };
        // Too long to represent means nothing can have been idle that long.
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return;
        };
        let now = self.inner.scheduler.now();
        let handles: Vec<_> = self
            .inner
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut evicted = 0;
        for (id, handle) in handles {
            let mut session = handle.lock();
            if now.signed_duration_since(session.updated_at) < ttl {
                continue;
            }
            self.cancel_timers(&mut session);
            session.status = SessionStatus::Closed;
            if self
                .inner
                .sessions
                .remove_if(&id, |_, stored| Arc::ptr_eq(stored, &handle))
                .is_some()
            {
                evicted += 1;
                tracing::info!(session = %id, "idle session evicted");
            }
        }
        if evicted > 0 {
            tracing::debug!(evicted, live = self.inner.sessions.len(), "idle sweep done");
        }
    }

    // -----------------------------------------------------------------------
    // Timer callbacks
    // -----------------------------------------------------------------------

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn on_countdown_expired(&self, session_id: &str, epoch: u64) {
        let Ok(handle) = self.session(session_id) else {
            return;
        };
        let mut session = handle.lock();
        if session.epoch != epoch || session.status != SessionStatus::SelectionOpen {
            tracing::debug!(session = %session_id, "stale countdown ignored");
            return;
        }
        tracing::info!(session = %session_id, "selection countdown expired");
        self.fill_missing(&mut session, AutoPick::Countdown);
        self.enter_starting(&mut session);
        self.touch(&mut session);
    }

    fn on_ai_choice(&self, session_id: &str, epoch: u64, seat: usize) {
        let Ok(handle) = self.session(session_id) else {
            return;
        };
        let mut session = handle.lock();
        if session.epoch != epoch || session.status != SessionStatus::SelectionOpen {
            return;
        }
        match session.players.get(seat) {
            Some(p) if p.is_ai() && p.character.is_none() => {}
            _ => return,
        }

        let mut pool = session.available_characters();
        let character = characters::draw(&mut pool, &mut rand::thread_rng())
            .unwrap_or_else(|| Self::placeholder_for(&session, AutoPick::Ai));
        let now = self.inner.scheduler.now();
        let player = &mut session.players[seat];
        player.character = Some(character);
        player.selected_at = Some(now);
        tracing::debug!(session = %session_id, seat, "AI picked a character");

        if session.all_claimed() {
            self.enter_starting(&mut session);
        }
        self.touch(&mut session);
    }

    fn on_start_delay(&self, session_id: &str, epoch: u64) {
        let Ok(handle) = self.session(session_id) else {
            return;
        };
        let mut session = handle.lock();
        if session.epoch != epoch || session.status != SessionStatus::Starting {
            return;
        }
        session.status = SessionStatus::InProgress;
        self.touch(&mut session);
        tracing::info!(session = %session_id, "session in progress");
    }
}
