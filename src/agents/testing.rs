use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::agent::{Agent, Outbox};
use super::errors::AgentResult;
use super::messages::Message;
use super::types::RoleId;

/// Stand-in agent that forwards everything it receives to a channel
pub(crate) struct InboxAgent {
    outbox: Outbox,
    tx: mpsc::UnboundedSender<Message>,
}

pub(crate) struct Inbox(mpsc::UnboundedReceiver<Message>);

impl InboxAgent {
    pub(crate) fn new(role: impl Into<RoleId>) -> (Arc<Self>, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let agent = Arc::new(Self {
            outbox: Outbox::new(role),
            tx,
        });
        (agent, Inbox(rx))
    }
}

#[async_trait]
impl Agent for InboxAgent {
    fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    async fn handle_message(&self, message: Message) -> AgentResult<()> {
        let _ = self.tx.send(message);
        Ok(())
    }
}

impl Inbox {
    pub(crate) async fn next(&mut self) -> Message {
        tokio::time::timeout(Duration::from_secs(2), self.0.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("inbox channel closed")
    }

    pub(crate) fn try_next(&mut self) -> Option<Message> {
        self.0.try_recv().ok()
    }
}
