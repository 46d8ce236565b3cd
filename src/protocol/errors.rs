use thiserror::Error;

use super::registry::SurfaceId;
use crate::render::SurfaceError;

/// Errors raised while dispatching a command to its handler
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No handler found for method: {verb} (surface {surface})")]
    HandlerNotFound { surface: SurfaceId, verb: String },

    #[error("Invalid params for {verb}: {source}")]
    InvalidParams {
        verb: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Rendering surface rejected the command: {0}")]
    Surface(#[from] SurfaceError),
}

pub type CommandResult<T> = Result<T, CommandError>;
