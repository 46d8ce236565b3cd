use std::time::Duration;

use thiserror::Error;

use crate::llm::LlmError;
use crate::protocol::CommandError;

/// Errors that can occur in the agent system
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM API error: {0}")]
    LlmError(#[from] LlmError),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent {0} is not registered on a message bus")]
    NotBound(String),

    #[error("Message bus is no longer running")]
    BusClosed,

    #[error("Could not route goal, model answered {answer:?}")]
    Classification { answer: String },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Command {action} failed: {source}")]
    CommandFailed {
        action: String,
        #[source]
        source: CommandError,
    },

    #[error("Message delivery failed: {0}")]
    MessageDeliveryFailed(String),

    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("A goal is already in flight")]
    GoalInFlight,

    #[error("No status reported within {0:?}")]
    Timeout(Duration),
}

pub type AgentResult<T> = Result<T, AgentError>;
