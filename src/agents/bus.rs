//! Role-keyed message routing between agents.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::agent::Agent;
use super::errors::{AgentError, AgentResult};
use super::messages::Message;
use super::types::RoleId;

/// Sees every dispatched message before it is routed
pub trait MessageObserver: Send + Sync {
    fn observe(&self, message: &Message);
}

#[derive(Default)]
struct BusInner {
    agents: RwLock<HashMap<RoleId, Arc<dyn Agent>>>,
    observers: RwLock<Vec<Arc<dyn MessageObserver>>>,
}

/// Registry of agents keyed by role
///
/// `dispatch` hands a message to the one agent registered under its
/// receiver and does not wait for it to be processed. Handlers run as tokio
/// tasks, so dispatching requires a running runtime. Cloning yields another
/// handle to the same bus.
#[derive(Clone, Default)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

/// Non-owning reference from an agent back to its bus
#[derive(Debug, Clone)]
pub struct BusHandle {
    inner: Weak<BusInner>,
}

impl BusHandle {
    pub fn upgrade(&self) -> Option<MessageBus> {
        self.inner.upgrade().map(|inner| MessageBus { inner })
    }

    pub(crate) fn same_bus(&self, other: &BusHandle) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> BusHandle {
        BusHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Store the agent under its role and bind it to this bus
    ///
    /// Registering a role again replaces the previous agent.
    pub fn register<A: Agent>(&self, agent: Arc<A>) {
        let role = agent.role().clone();
        agent.outbox().bind(self.handle());

        let previous = self
            .inner
            .agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(role.clone(), agent);

        if previous.is_some() {
            debug!(role = %role, "Replaced agent registration");
        } else {
            debug!(role = %role, "Registered agent");
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn MessageObserver>) {
        self.inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn is_registered(&self, role: &RoleId) -> bool {
        self.inner
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(role)
    }

    /// Registered roles, sorted
    pub fn roles(&self) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = self
            .inner
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        roles.sort();
        roles
    }

    /// Route a message to the agent registered under its receiver
    ///
    /// Unknown receivers are logged and the message is dropped; the returned
    /// [`Delivery`] says which happened and can be awaited for completion.
    pub fn dispatch(&self, message: Message) -> Delivery {
        let observers = self
            .inner
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer.observe(&message);
        }

        let agent = self
            .inner
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.receiver)
            .cloned();

        let Some(agent) = agent else {
            warn!(
                sender = %message.sender,
                receiver = %message.receiver,
                "No agent found for role, dropping message"
            );
            return Delivery::Undeliverable(message.receiver);
        };

        debug!(sender = %message.sender, receiver = %message.receiver, "Delivering message");
        let receiver = message.receiver.clone();
        Delivery::Delivered(tokio::spawn(async move {
            let result = agent.handle_message(message).await;
            if let Err(e) = &result {
                error!(role = %receiver, error = %e, "Agent failed to handle message");
            }
            result
        }))
    }
}

/// Outcome of [`MessageBus::dispatch`]
///
/// Dropping it leaves the handler running.
#[derive(Debug)]
pub enum Delivery {
    Delivered(JoinHandle<AgentResult<()>>),
    Undeliverable(RoleId),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }

    /// Wait until the receiving agent has finished handling the message
    pub async fn completion(self) -> AgentResult<()> {
        match self {
            Delivery::Delivered(handle) => handle
                .await
                .map_err(|e| AgentError::MessageDeliveryFailed(e.to_string()))?,
            Delivery::Undeliverable(role) => Err(AgentError::AgentNotFound(role.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::Outbox;
    use crate::agents::messages::Payload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingAgent {
        outbox: Outbox,
        received: Mutex<Vec<Message>>,
    }

    impl RecordingAgent {
        fn new(role: &str) -> Arc<Self> {
            Arc::new(Self {
                outbox: Outbox::new(role),
                received: Mutex::new(Vec::new()),
            })
        }

        fn received(&self) -> Vec<Message> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Agent for RecordingAgent {
        fn outbox(&self) -> &Outbox {
            &self.outbox
        }

        async fn handle_message(&self, message: Message) -> AgentResult<()> {
            self.received.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        seen: Mutex<Vec<RoleId>>,
    }

    impl MessageObserver for CountingObserver {
        fn observe(&self, message: &Message) {
            self.seen.lock().unwrap().push(message.receiver.clone());
        }
    }

    fn message(to: &str) -> Message {
        Message {
            sender: RoleId::ui(),
            receiver: RoleId::new(to),
            content: Payload::goal("Draw a red square"),
        }
    }

    #[tokio::test]
    async fn dispatch_delivers_exact_message_once() {
        let bus = MessageBus::new();
        let agent = RecordingAgent::new("painter");
        bus.register(Arc::clone(&agent));

        let delivery = bus.dispatch(message("painter"));
        assert!(delivery.is_delivered());
        delivery.completion().await.unwrap();

        assert_eq!(agent.received(), vec![message("painter")]);
    }

    #[tokio::test]
    async fn unknown_receiver_is_dropped() {
        let bus = MessageBus::new();
        let agent = RecordingAgent::new("painter");
        bus.register(Arc::clone(&agent));

        let delivery = bus.dispatch(message("nobody"));

        assert!(!delivery.is_delivered());
        assert!(matches!(
            delivery.completion().await,
            Err(AgentError::AgentNotFound(role)) if role == "nobody"
        ));
        assert!(agent.received().is_empty());
    }

    #[tokio::test]
    async fn reregistering_role_replaces_agent() {
        let bus = MessageBus::new();
        let first = RecordingAgent::new("painter");
        let second = RecordingAgent::new("painter");
        bus.register(Arc::clone(&first));
        bus.register(Arc::clone(&second));

        bus.dispatch(message("painter")).completion().await.unwrap();

        assert!(first.received().is_empty());
        assert_eq!(second.received().len(), 1);
        assert_eq!(bus.roles(), vec![RoleId::new("painter")]);
    }

    #[tokio::test]
    async fn send_before_register_fails_loudly() {
        let agent = RecordingAgent::new("painter");

        let result = agent.outbox().send(RoleId::manager(), Payload::task("x"));

        assert!(matches!(result, Err(AgentError::NotBound(role)) if role == "painter"));
        assert!(!agent.outbox().is_bound());
    }

    #[tokio::test]
    async fn send_after_bus_dropped_reports_closed() {
        let agent = RecordingAgent::new("painter");
        {
            let bus = MessageBus::new();
            bus.register(Arc::clone(&agent));
        }

        let result = agent.outbox().send(RoleId::manager(), Payload::task("x"));
        assert!(matches!(result, Err(AgentError::BusClosed)));
    }

    #[tokio::test]
    async fn outbox_sets_sender_to_own_role() {
        let bus = MessageBus::new();
        let sender = RecordingAgent::new("painter");
        let receiver = RecordingAgent::new("manager");
        bus.register(Arc::clone(&sender));
        bus.register(Arc::clone(&receiver));

        sender
            .outbox()
            .send(RoleId::manager(), Payload::task("x"))
            .unwrap()
            .completion()
            .await
            .unwrap();

        let received = receiver.received();
        assert_eq!(received[0].sender, RoleId::new("painter"));
        assert_eq!(received[0].content, Payload::task("x"));
    }

    #[tokio::test]
    async fn observers_see_delivered_and_dropped_messages() {
        let bus = MessageBus::new();
        let observer = Arc::new(CountingObserver::default());
        bus.add_observer(observer.clone());
        bus.register(RecordingAgent::new("painter"));

        bus.dispatch(message("painter")).completion().await.unwrap();
        let _ = bus.dispatch(message("nobody"));

        assert_eq!(
            *observer.seen.lock().unwrap(),
            vec![RoleId::new("painter"), RoleId::new("nobody")]
        );
    }
}
