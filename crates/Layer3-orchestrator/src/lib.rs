//! # lumina-orchestrator
//!
//! Request orchestration layer for Lumina. One call answers one request:
//! dispatch on a closed action set, consult quota and cache, generate
//! through the retrying provider, filter, persist, respond.

pub mod action;
pub mod generation;
pub mod orchestrator;

pub use action::{parse_action, Action};
pub use generation::PLACEHOLDER_IMAGE_URL;
pub use orchestrator::RequestOrchestrator;
