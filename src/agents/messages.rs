// Inter-agent messages
//
// The only protocol crossing agent boundaries: who sent it, who should get
// it, and a loosely shaped payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::RoleId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: RoleId,
    pub receiver: RoleId,
    pub content: Payload,
}

/// Message content; unrecognised shapes are kept as raw JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Status(StatusReport),
    Goal { goal: String },
    Task { task: String },
    Other(Value),
}

impl Payload {
    pub fn goal(goal: impl Into<String>) -> Self {
        Payload::Goal { goal: goal.into() }
    }

    pub fn task(task: impl Into<String>) -> Self {
        Payload::Task { task: task.into() }
    }

    /// Compact JSON rendering, used for logs
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

impl From<StatusReport> for Payload {
    fn from(report: StatusReport) -> Self {
        Payload::Status(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Complete,
    Error,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Complete => write!(f, "complete"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

/// `{ status, task?, error? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn complete(task: Option<String>) -> Self {
        Self {
            status: TaskStatus::Complete,
            task,
            error: None,
        }
    }

    pub fn error(task: Option<String>, error: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Error,
            task,
            error: Some(error.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }
}
