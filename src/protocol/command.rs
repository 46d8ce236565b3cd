use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a model-generated plan: `{ "action": ..., "params": {...} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: String,
    #[serde(default = "empty_params")]
    pub params: Value,
}

fn empty_params() -> Value {
    Value::Object(Default::default())
}

impl Command {
    pub fn new(action: impl Into<String>, params: Value) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }
}

/// Parse a plan: a JSON array of commands, executed in array order
pub fn parse_batch(text: &str) -> Result<Vec<Command>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Result returned by every command handler
///
/// Hard failures are reported as [`super::CommandError`]; `success: false`
/// is reserved for expected, recoverable conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}
