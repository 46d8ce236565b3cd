use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use super::agent::{Agent, Outbox};
use super::errors::{AgentError, AgentResult};
use super::messages::{Message, Payload, StatusReport};
use super::prompts::{library, PromptTemplate};
use super::types::{BatchPolicy, ExpertKind, RoleId};
use crate::llm::{extract_fenced, LanguageModel};
use crate::protocol::{parse_batch, Command, CommandEndpoint};
use crate::render::scene::SCENE_NAMESPACE;

/// What distinguishes one expert from another
#[derive(Debug, Clone)]
pub struct ExpertProfile {
    pub kind: ExpertKind,
    pub prompt: PromptTemplate,
    /// Static text embedded in every plan prompt
    pub guidance: Option<&'static str>,
    /// Prefix added to actions that do not already carry it
    pub namespace: Option<&'static str>,
    /// Verb that restores the surface to its initial state
    pub reset_verb: &'static str,
}

impl ExpertProfile {
    pub fn canvas() -> Self {
        Self {
            kind: ExpertKind::Canvas,
            prompt: library::canvas_plan(),
            guidance: None,
            namespace: None,
            reset_verb: "reset_canvas",
        }
    }

    pub fn scene() -> Self {
        Self {
            kind: ExpertKind::Scene,
            prompt: library::scene_plan(),
            guidance: Some(library::SCENE_GUIDANCE),
            namespace: Some(SCENE_NAMESPACE),
            reset_verb: "scene/clear_scene",
        }
    }

    pub fn for_kind(kind: ExpertKind) -> Self {
        match kind {
            ExpertKind::Canvas => Self::canvas(),
            ExpertKind::Scene => Self::scene(),
        }
    }

    /// The verb to look up for a planned action
    pub fn qualify<'a>(&self, action: &'a str) -> Cow<'a, str> {
        match self.namespace {
            Some(namespace) if !action.starts_with(namespace) => {
                Cow::Owned(format!("{}{}", namespace, action))
            }
            _ => Cow::Borrowed(action),
        }
    }

    pub fn plan_prompt(&self, task: &str) -> String {
        self.prompt
            .render(&[("goal", task), ("guidance", self.guidance.unwrap_or_default())])
    }
}

/// Turns a task into a command batch and runs it against one surface
///
/// Commands run strictly in plan order, each awaited before the next. A
/// command that fails hard stops the batch; results reporting
/// `success: false` are logged and the batch goes on.
pub struct ExpertAgent {
    outbox: Outbox,
    profile: ExpertProfile,
    model: Arc<dyn LanguageModel>,
    endpoint: CommandEndpoint,
    policy: BatchPolicy,
}

impl ExpertAgent {
    pub fn new(profile: ExpertProfile, model: Arc<dyn LanguageModel>, endpoint: CommandEndpoint) -> Self {
        Self {
            outbox: Outbox::new(profile.kind),
            profile,
            model,
            endpoint,
            policy: BatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn kind(&self) -> ExpertKind {
        self.profile.kind
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Run every command in order, stopping at the first hard failure
    ///
    /// Returns how many commands ran.
    pub async fn execute_batch(&self, commands: &[Command]) -> AgentResult<usize> {
        for (index, command) in commands.iter().enumerate() {
            let verb = self.profile.qualify(&command.action);
            let outcome = self
                .endpoint
                .send_request(&verb, command.params.clone())
                .await
                .map_err(|source| AgentError::CommandFailed {
                    action: verb.to_string(),
                    source,
                })?;

            if !outcome.success {
                warn!(
                    expert = %self.profile.kind,
                    index,
                    verb = %verb,
                    error = outcome.error.as_deref().unwrap_or("unspecified"),
                    "Command reported failure"
                );
            }
        }
        Ok(commands.len())
    }

    async fn run_task(&self, task: String) -> AgentResult<()> {
        let label = self.profile.kind.label();
        let prompt = self.profile.plan_prompt(&task);

        let answer = match self.model.complete(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                self.report_error(format!("{} expert could not get a plan: {}", label, e))?;
                return Err(e.into());
            }
        };

        let commands = match parse_batch(extract_fenced(&answer)) {
            Ok(commands) => commands,
            Err(e) => {
                let message = format!("{} expert failed to produce valid JSON: {}", label, e);
                warn!(expert = %self.profile.kind, error = %e, "Plan is not a command array");
                self.report_error(message.clone())?;
                return Err(AgentError::InvalidPlan(message));
            }
        };

        debug!(expert = %self.profile.kind, count = commands.len(), "Executing plan");
        match self.execute_batch(&commands).await {
            Ok(count) => {
                info!(expert = %self.profile.kind, count, task = %task, "Batch complete");
                self.outbox
                    .send(RoleId::manager(), StatusReport::complete(Some(task)))?;
                Ok(())
            }
            Err(e) => {
                if self.policy == BatchPolicy::ResetOnFailure {
                    self.reset_surface().await;
                }
                self.report_error(e.to_string())?;
                Err(e)
            }
        }
    }

    async fn reset_surface(&self) {
        match self.endpoint.send_request(self.profile.reset_verb, json!({})).await {
            Ok(_) => info!(expert = %self.profile.kind, "Surface reset after failed batch"),
            Err(e) => warn!(expert = %self.profile.kind, error = %e, "Could not reset surface"),
        }
    }

    fn report_error(&self, error: String) -> AgentResult<()> {
        self.outbox
            .send(RoleId::manager(), StatusReport::error(None, error))?;
        Ok(())
    }
}

#[async_trait]
impl Agent for ExpertAgent {
    fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    async fn handle_message(&self, message: Message) -> AgentResult<()> {
        match message.content {
            Payload::Task { task } => self.run_task(task).await,
            other => {
                debug!(sender = %message.sender, content = %other.to_json(), "Expert ignored message");
                Ok(())
            }
        }
    }
}
