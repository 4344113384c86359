//! Session — the orchestration controller and its HTTP surface.

pub mod handlers;
pub mod state;
