//! Agent Swarm Library
//!
//! Turns natural-language goals into rendering commands by routing them
//! through cooperating agents that consult a language model. Includes the
//! message bus, the command registry, the canvas and scene command servers
//! and an HTTP surface for embedding a session.

pub mod agents;
pub mod api;
pub mod config;
pub mod llm;
pub mod protocol;
pub mod render;
pub mod session;
