//! Deferred-callback scheduling with a pluggable clock.
//!
//! The lobby never calls `tokio::time` directly. Production wires in
//! [`TokioScheduler`]; tests drive [`ManualScheduler`] by advancing a fake
//! clock, so countdowns and AI delays fire deterministically.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

pub type TimerId = u64;

/// A callback fired once when its timer elapses.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Current wall-clock time as seen by this scheduler.
    fn now(&self) -> DateTime<Utc>;

    /// Run `task` after `delay` unless cancelled first.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerId;

    /// Cancel a pending timer. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

// ---------------------------------------------------------------------------
// Tokio-backed scheduler
// ---------------------------------------------------------------------------

/// Spawns one sleeping task per timer on the current tokio runtime.
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    /// Pending timers. A slot's abort handle is filled in right after spawn.
    pending: Arc<DashMap<TimerId, Option<AbortHandle>>>,
}

impl TokioScheduler {
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self {
            runtime: Handle::current(),
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending.insert(id, None);

        let pending = self.pending.clone();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Whoever removes the slot owns it: a cancelled timer is already gone.
            if pending.remove(&id).is_some() {
                task();
            }
        });

        if let Some(mut slot) = self.pending.get_mut(&id) {
            *slot = Some(handle.abort_handle());
        }
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some((_, Some(handle))) = self.pending.remove(&id) {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Manual (fake-clock) scheduler
// ---------------------------------------------------------------------------

struct ManualState {
    elapsed: Duration,
    next_id: TimerId,
    queue: BTreeMap<(Duration, TimerId), TimerTask>,
    due_at: HashMap<TimerId, Duration>,
}

/// A scheduler whose clock only moves when told to.
pub struct ManualScheduler {
    start: DateTime<Utc>,
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                next_id: 1,
                queue: BTreeMap::new(),
                due_at: HashMap::new(),
            }),
        }
    }

    /// Move the clock forward by `by`, firing every timer that falls due in
    /// deadline order. Timers scheduled by fired callbacks also run if they
    /// fall inside the window.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().elapsed + by;
        loop {
            let task = {
                let mut state = self.state.lock();
                let next = state
                    .queue
                    .keys()
                    .next()
                    .copied()
                    .filter(|(due, _)| *due <= target);
                match next {
                    Some(key) => {
                        state.elapsed = key.0;
                        state.due_at.remove(&key.1);
                        state.queue.remove(&key)
                    }
                    None => {
                        state.elapsed = target;
                        None
                    }
                }
            };
            // Run outside the lock so callbacks can schedule more timers.
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Time until the earliest pending timer, if any.
    pub fn next_due_in(&self) -> Option<Duration> {
        let state = self.state.lock();
        state
            .queue
            .keys()
            .next()
            .map(|(due, _)| due.saturating_sub(state.elapsed))
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.state.lock().elapsed;
        self.start + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerId {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.elapsed + delay;
        state.queue.insert((due, id), task);
        state.due_at.insert(id, due);
        id
    }

    fn cancel(&self, id: TimerId) {
        let mut state = self.state.lock();
        if let Some(due) = state.due_at.remove(&id) {
            state.queue.remove(&(due, id));
        }
    }
}
