//! Per-session concurrency guard.
//!
//! At most one turn (start or submit) may run per session. Acquisition is
//! try-acquire: a second caller is rejected immediately with
//! `AlreadyInFlight` rather than queued, so a rapid double-submit cannot
//! answer a stale question. The permit releases itself on drop, which
//! covers every exit path including collaborator errors.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::CoachError;

/// Registry of sessions with an in-flight turn.
#[derive(Clone, Default)]
pub struct SessionGuard {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking acquisition of the session's exclusive slot.
    pub fn try_acquire(&self, session_id: Uuid) -> Result<SessionPermit, CoachError> {
        let mut held = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !held.insert(session_id) {
            return Err(CoachError::AlreadyInFlight);
        }
        Ok(SessionPermit {
            session_id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Whether a turn is currently in flight for the session.
    pub fn is_held(&self, session_id: Uuid) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&session_id)
    }
}

/// Exclusive hold on one session, released on drop.
#[must_use = "dropping the permit releases the session immediately"]
pub struct SessionPermit {
    session_id: Uuid,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.session_id);
    }
}
