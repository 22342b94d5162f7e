pub mod engine;
pub mod error;
pub mod gamification;
pub mod guard;
pub mod orchestrator;
pub mod retry;
pub mod session;
pub mod store;
pub mod summary;
pub mod timer;
