use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use super::agent::{Agent, Outbox};
use super::bus::Delivery;
use super::errors::{AgentError, AgentResult};
use super::messages::{Message, Payload, StatusReport};
use super::types::RoleId;

/// The `ui` role: submits goals and publishes the status reports it receives
pub struct UiAgent {
    outbox: Outbox,
    status: watch::Sender<Option<StatusReport>>,
}

impl Default for UiAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl UiAgent {
    pub fn new() -> Self {
        let (status, _) = watch::channel(None);
        Self {
            outbox: Outbox::new(RoleId::ui()),
            status,
        }
    }

    /// Receiver that sees every status published from now on
    pub fn subscribe(&self) -> watch::Receiver<Option<StatusReport>> {
        self.status.subscribe()
    }

    pub fn latest(&self) -> Option<StatusReport> {
        self.status.borrow().clone()
    }

    /// Hand a goal to the manager
    ///
    /// # Errors
    /// * `AgentError::InvalidGoal` - the goal is blank
    /// * `AgentError::NotBound` - the agent was never registered
    pub fn submit_goal(&self, goal: &str) -> AgentResult<Delivery> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(AgentError::InvalidGoal("goal must not be empty".to_string()));
        }
        info!(goal = %goal, "Submitting goal");
        self.outbox.send(RoleId::manager(), Payload::goal(goal))
    }
}

#[async_trait]
impl Agent for UiAgent {
    fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    async fn handle_message(&self, message: Message) -> AgentResult<()> {
        match message.content {
            Payload::Status(report) => {
                info!(status = %report.status, error = ?report.error, "Goal finished");
                self.status.send_replace(Some(report));
            }
            other => debug!(sender = %message.sender, content = %other.to_json(), "UI ignored message"),
        }
        Ok(())
    }
}
