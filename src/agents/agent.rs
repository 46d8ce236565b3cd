use std::sync::OnceLock;

use async_trait::async_trait;
use tracing::{error, warn};

use super::bus::{BusHandle, Delivery, MessageBus};
use super::errors::{AgentError, AgentResult};
use super::messages::{Message, Payload};
use super::types::RoleId;

/// An independently addressable unit of behavior
///
/// Agents never hold references to each other; everything goes through the
/// bus they are registered on, addressed by role.
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    /// Outbound side of the agent, carrying its role
    fn outbox(&self) -> &Outbox;

    fn role(&self) -> &RoleId {
        self.outbox().role()
    }

    async fn handle_message(&self, message: Message) -> AgentResult<()>;
}

/// Role plus the back-reference to the bus an agent was registered on
#[derive(Debug)]
pub struct Outbox {
    role: RoleId,
    bus: OnceLock<BusHandle>,
}

impl Outbox {
    pub fn new(role: impl Into<RoleId>) -> Self {
        Self {
            role: role.into(),
            bus: OnceLock::new(),
        }
    }

    pub fn role(&self) -> &RoleId {
        &self.role
    }

    pub fn is_bound(&self) -> bool {
        self.bus.get().is_some()
    }

    /// Bind to a bus; the first binding sticks
    pub(crate) fn bind(&self, handle: BusHandle) {
        if let Err(rejected) = self.bus.set(handle) {
            let same = self.bus.get().is_some_and(|bound| bound.same_bus(&rejected));
            if !same {
                warn!(role = %self.role, "Agent is already bound to another message bus");
            }
        }
    }

    fn bus(&self) -> AgentResult<MessageBus> {
        let handle = self.bus.get().ok_or_else(|| {
            error!(role = %self.role, "MessageBus not set for agent");
            AgentError::NotBound(self.role.to_string())
        })?;
        handle.upgrade().ok_or(AgentError::BusClosed)
    }

    /// Send `content` to `receiver`, with this agent as sender
    ///
    /// # Errors
    /// * `AgentError::NotBound` - the agent was never registered
    /// * `AgentError::BusClosed` - the bus has been dropped
    pub fn send(&self, receiver: impl Into<RoleId>, content: impl Into<Payload>) -> AgentResult<Delivery> {
        let bus = self.bus()?;
        Ok(bus.dispatch(Message {
            sender: self.role.clone(),
            receiver: receiver.into(),
            content: content.into(),
        }))
    }

    /// Whether some agent is currently registered under `role`
    pub fn is_registered(&self, role: &RoleId) -> AgentResult<bool> {
        Ok(self.bus()?.is_registered(role))
    }
}
