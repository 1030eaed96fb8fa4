use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use prize_wheel::shared_wheel_game::{RevealScheduler, RevealTask};
use prize_wheel::{ReadinessSignal, WheelSession};
use tokio::runtime::Handle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Fires reveal tasks on the tokio runtime. The spawned task is detached, so
/// nothing can cancel a reveal once it is scheduled.
#[derive(Debug, Clone)]
pub struct TokioRevealScheduler {
    handle: Handle,
}

impl TokioRevealScheduler {
    pub fn current() -> Self {
        Self {
            handle: Handle::current(),
        }
    }
}

impl RevealScheduler for TokioRevealScheduler {
    fn schedule(&self, delay: Duration, task: RevealTask) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub wheel: WheelSession,
    pub gate: ReadinessSignal,
    last_seen: Instant,
}

/// Live sessions, one per page view. Kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, wheel: WheelSession) -> Uuid {
        let gate = ReadinessSignal::new();
        wheel.attach_gate(&gate);

        let id = Uuid::new_v4();
        self.lock().insert(
            id,
            SessionEntry {
                wheel,
                gate,
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Looks a session up and refreshes its idle timer.
    pub fn get(&self, id: Uuid) -> Result<SessionEntry> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(&id).ok_or(Error::SessionNotFound)?;
        entry.last_seen = Instant::now();
        Ok(entry.clone())
    }

    /// Delivers the readiness signal. Later calls are no-ops.
    pub fn signal_ready(&self, id: Uuid) -> Result<SessionEntry> {
        let entry = self.get(id)?;
        if entry.gate.signal() {
            tracing::info!("Session {} is ready to spin", id);
        }
        Ok(entry)
    }

    /// Drops sessions idle for longer than `ttl`. Returns how many went.
    pub fn sweep(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}
