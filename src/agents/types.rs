use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name under which an agent is registered on the bus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    pub fn manager() -> Self {
        Self::new("manager")
    }

    pub fn ui() -> Self {
        Self::new("ui")
    }

    pub fn logger() -> Self {
        Self::new("logger")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(role: &str) -> Self {
        Self::new(role)
    }
}

impl From<ExpertKind> for RoleId {
    fn from(kind: ExpertKind) -> Self {
        kind.role()
    }
}

/// The closed set of specialists a goal can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertKind {
    Canvas,
    Scene,
}

impl ExpertKind {
    pub const ALL: [ExpertKind; 2] = [ExpertKind::Canvas, ExpertKind::Scene];

    /// Role name the expert registers under
    pub fn role_name(&self) -> &'static str {
        match self {
            ExpertKind::Canvas => "canvas_expert",
            ExpertKind::Scene => "scene_expert",
        }
    }

    pub fn role(&self) -> RoleId {
        RoleId::new(self.role_name())
    }

    pub fn from_role_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.role_name() == name)
    }

    /// Human readable name used in reports
    pub fn label(&self) -> &'static str {
        match self {
            ExpertKind::Canvas => "Canvas",
            ExpertKind::Scene => "Scene",
        }
    }
}

impl fmt::Display for ExpertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role_name())
    }
}

/// What an expert does with side effects already applied when a batch fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Leave the partial result in place
    #[default]
    BestEffort,
    /// Issue the surface's reset verb before reporting the failure
    ResetOnFailure,
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(BatchPolicy::BestEffort),
            "reset_on_failure" | "reset-on-failure" => Ok(BatchPolicy::ResetOnFailure),
            other => Err(format!("unknown batch policy: {}", other)),
        }
    }
}
