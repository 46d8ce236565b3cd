// Agent system modules
//
// Agents talk to each other only through the message bus, addressed by
// role. The manager classifies goals, experts turn tasks into command
// batches, and the logger and ui roles observe the outcome.

pub mod agent;
pub mod bus;
pub mod errors;
pub mod expert;
pub mod logger;
pub mod manager;
pub mod messages;
pub mod prompts;
pub mod types;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use agent::{Agent, Outbox};
pub use bus::{BusHandle, Delivery, MessageBus, MessageObserver};
pub use errors::{AgentError, AgentResult};
pub use expert::{ExpertAgent, ExpertProfile};
pub use logger::{LogEntry, LoggerAgent};
pub use manager::ManagerAgent;
pub use messages::{Message, Payload, StatusReport, TaskStatus};
pub use types::{BatchPolicy, ExpertKind, RoleId};
pub use ui::UiAgent;
