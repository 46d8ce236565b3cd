use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::agent::{Agent, Outbox};
use super::bus::MessageObserver;
use super::errors::AgentResult;
use super::messages::Message;
use super::types::RoleId;

/// One line of the traffic log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub sender: RoleId,
    pub receiver: RoleId,
    pub line: String,
}

impl LogEntry {
    fn from_message(message: &Message) -> Self {
        Self {
            at: Utc::now(),
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            line: format!(
                "[{} -> {}]: {}",
                message.sender,
                message.receiver,
                message.content.to_json()
            ),
        }
    }
}

/// Keeps the most recent messages seen on the bus
///
/// Installed both as an observer, which sees all traffic, and as the agent
/// behind the `logger` role. Messages addressed to `logger` are recorded
/// when handled rather than when observed, so each is logged once.
pub struct LoggerAgent {
    outbox: Outbox,
    capacity: usize,
    entries: RwLock<VecDeque<LogEntry>>,
}

impl LoggerAgent {
    pub fn new(capacity: usize) -> Self {
        Self {
            outbox: Outbox::new(RoleId::logger()),
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, message: &Message) {
        let entry = LogEntry::from_message(message);
        info!(target: "agent_swarm::traffic", "{}", entry.line);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

impl MessageObserver for LoggerAgent {
    fn observe(&self, message: &Message) {
        if message.receiver != *self.role() {
            self.record(message);
        }
    }
}

#[async_trait]
impl Agent for LoggerAgent {
    fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    async fn handle_message(&self, message: Message) -> AgentResult<()> {
        self.record(&message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::bus::MessageBus;
    use crate::agents::messages::{Payload, StatusReport};
    use std::sync::Arc;

    fn message(from: RoleId, to: RoleId, content: Payload) -> Message {
        Message {
            sender: from,
            receiver: to,
            content,
        }
    }

    #[test]
    fn formats_lines_with_roles_and_json() {
        let logger = LoggerAgent::new(10);
        logger.observe(&message(
            RoleId::manager(),
            RoleId::ui(),
            StatusReport::complete(None).into(),
        ));

        let entries = logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line, r#"[manager -> ui]: {"status":"complete"}"#);
    }

    #[test]
    fn drops_oldest_beyond_capacity() {
        let logger = LoggerAgent::new(2);
        for goal in ["a", "b", "c"] {
            logger.observe(&message(RoleId::ui(), RoleId::manager(), Payload::goal(goal)));
        }

        let lines: Vec<String> = logger.entries().into_iter().map(|e| e.line).collect();
        assert_eq!(
            lines,
            vec![
                r#"[ui -> manager]: {"goal":"b"}"#.to_string(),
                r#"[ui -> manager]: {"goal":"c"}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn logs_observed_and_direct_messages_once() {
        let bus = MessageBus::new();
        let logger = Arc::new(LoggerAgent::new(10));
        bus.register(logger.clone());
        bus.add_observer(logger.clone());

        let _ = bus.dispatch(message(RoleId::ui(), RoleId::manager(), Payload::goal("x")));
        bus.dispatch(message(RoleId::ui(), RoleId::logger(), Payload::task("note")))
            .completion()
            .await
            .unwrap();

        let receivers: Vec<RoleId> = logger.entries().into_iter().map(|e| e.receiver).collect();
        assert_eq!(receivers, vec![RoleId::manager(), RoleId::logger()]);
    }
}
