//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources handed to the HTTP handlers.

use crate::config::Config;
use coach_core::{orchestrator::SessionOrchestrator, store::SessionStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,
    pub store: Arc<dyn SessionStore>,
    pub config: Arc<Config>,
}
