//! Browser session rotation
//!
//! A session is the browser identity shared by every tab: its cookie jar and
//! proxy exit. Sessions carry a usage and an error budget. An exhausted
//! session is reported at acquisition so the request fails as `threshold`,
//! and retiring a session makes the next acquirer clear the cookie jar.

use log::{debug, info};
use parking_lot::Mutex;

/// Handed to a worker for the duration of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLease {
    pub id: u64,
    /// The cookie jar still belongs to a retired session and must be cleared.
    pub needs_reset: bool,
}

/// Session that ran out of budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session {id} exhausted ({usage} requests, {errors} errors)")]
pub struct SessionExhausted {
    pub id: u64,
    pub usage: u32,
    pub errors: u32,
}

#[derive(Debug)]
struct SessionState {
    id: u64,
    usage: u32,
    errors: u32,
    reset_pending: bool,
}

#[derive(Debug)]
pub struct SessionPool {
    state: Mutex<SessionState>,
    max_usage: u32,
    max_errors: u32,
}

impl SessionPool {
    #[must_use]
    pub fn new(max_usage: u32, max_errors: u32) -> Self {
        Self {
            state: Mutex::new(SessionState {
                id: 0,
                usage: 0,
                errors: 0,
                reset_pending: false,
            }),
            max_usage,
            max_errors,
        }
    }

    /// Lease the current session for one request.
    ///
    /// # Errors
    /// `SessionExhausted` once the session hit its usage or error budget; it
    /// stays exhausted until retired.
    pub fn acquire(&self) -> Result<SessionLease, SessionExhausted> {
        let mut state = self.state.lock();
        if state.usage >= self.max_usage || state.errors >= self.max_errors {
            return Err(SessionExhausted {
                id: state.id,
                usage: state.usage,
                errors: state.errors,
            });
        }
        state.usage += 1;
        let needs_reset = std::mem::take(&mut state.reset_pending);
        Ok(SessionLease {
            id: state.id,
            needs_reset,
        })
    }

    /// Count a failed request against session `id`.
    pub fn record_error(&self, id: u64) {
        let mut state = self.state.lock();
        if state.id == id {
            state.errors += 1;
            debug!("Session {} error count {}", id, state.errors);
        }
    }

    /// Replace session `id` with a fresh identity.
    ///
    /// Concurrent retirements of the same session rotate only once.
    pub fn retire(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        if state.id != id {
            return false;
        }
        info!(
            "Retiring session {} after {} requests and {} errors",
            id, state.usage, state.errors
        );
        state.id += 1;
        state.usage = 0;
        state.errors = 0;
        state.reset_pending = true;
        true
    }

    /// Number of rotations so far.
    #[must_use]
    pub fn rotations(&self) -> u64 {
        self.state.lock().id
    }
}
