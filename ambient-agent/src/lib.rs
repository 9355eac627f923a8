//! The pipeline orchestrator (C6), HTTP API (C7), and quick-enhance
//! controller (C8) wired together into one process.

pub mod http;
pub mod orchestrator;
pub mod quickenhance;
pub mod state;

pub use orchestrator::{Orchestrator, Status};
pub use state::{AppState, SharedState};
