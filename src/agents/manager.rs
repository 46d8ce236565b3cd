use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::agent::{Agent, Outbox};
use super::errors::{AgentError, AgentResult};
use super::messages::{Message, Payload, StatusReport};
use super::prompts::library;
use super::types::{ExpertKind, RoleId};
use crate::llm::{extract_fenced, LanguageModel};

/// Routes goals to the expert best suited for them and relays their status
///
/// The manager keeps no record of outstanding work. A goal is classified
/// against the experts it was configured with, and the answer must name one
/// of them that is currently registered; anything else is reported to `ui`
/// as a classification error instead of being sent nowhere.
pub struct ManagerAgent {
    outbox: Outbox,
    model: Arc<dyn LanguageModel>,
    experts: Vec<ExpertKind>,
}

impl ManagerAgent {
    pub fn new(model: Arc<dyn LanguageModel>, experts: Vec<ExpertKind>) -> Self {
        Self {
            outbox: Outbox::new(RoleId::manager()),
            model,
            experts,
        }
    }

    pub fn experts(&self) -> &[ExpertKind] {
        &self.experts
    }

    /// Ask the model which expert should handle `goal`
    ///
    /// # Errors
    /// * `AgentError::LlmError` - the model call failed
    /// * `AgentError::Classification` - the answer is not a configured,
    ///   registered expert
    pub async fn classify(&self, goal: &str) -> AgentResult<ExpertKind> {
        let experts = self
            .experts
            .iter()
            .map(ExpertKind::role_name)
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = library::expert_routing().render(&[("goal", goal), ("experts", &experts)]);

        let answer = self.model.complete(&prompt).await?;
        let normalized = normalize_answer(&answer);

        let Some(kind) =
            ExpertKind::from_role_name(&normalized).filter(|kind| self.experts.contains(kind))
        else {
            return Err(AgentError::Classification { answer: normalized });
        };

        if !self.outbox.is_registered(&kind.role())? {
            warn!(expert = %kind, "Classified expert is not registered");
            return Err(AgentError::Classification { answer: normalized });
        }

        Ok(kind)
    }

    async fn route_goal(&self, goal: String) -> AgentResult<()> {
        match self.classify(&goal).await {
            Ok(kind) => {
                info!(expert = %kind, goal = %goal, "Routing goal");
                self.outbox.send(kind.role(), Payload::task(goal))?;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, goal = %goal, "Could not route goal");
                self.outbox
                    .send(RoleId::ui(), StatusReport::error(None, e.to_string()))?;
                Err(e)
            }
        }
    }

    fn relay_status(&self, report: StatusReport) -> AgentResult<()> {
        let simplified = if report.is_complete() {
            StatusReport::complete(None)
        } else {
            StatusReport::error(
                None,
                report.error.unwrap_or_else(|| "Task failed".to_string()),
            )
        };
        self.outbox.send(RoleId::ui(), simplified)?;
        Ok(())
    }
}

#[async_trait]
impl Agent for ManagerAgent {
    fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    async fn handle_message(&self, message: Message) -> AgentResult<()> {
        match message.content {
            Payload::Goal { goal } => self.route_goal(goal).await,
            Payload::Status(report) => self.relay_status(report),
            other => {
                debug!(sender = %message.sender, content = %other.to_json(), "Manager ignored message");
                Ok(())
            }
        }
    }
}

/// Reduce a free-form model answer to a bare role name
fn normalize_answer(answer: &str) -> String {
    // reasoning models prefix their answer with a think block
    let answer = match answer.rfind("</think>") {
        Some(end) => &answer[end + "</think>".len()..],
        None => answer,
    };

    extract_fenced(answer)
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim_end_matches('.')
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::bus::MessageBus;
    use crate::agents::messages::TaskStatus;
    use crate::agents::testing::InboxAgent;
    use crate::llm::ScriptedModel;

    fn manager(answers: &[&str]) -> (Arc<ManagerAgent>, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel::new(answers.iter().copied()));
        let manager = Arc::new(ManagerAgent::new(model.clone(), ExpertKind::ALL.to_vec()));
        (manager, model)
    }

    fn goal(text: &str) -> Message {
        Message {
            sender: RoleId::ui(),
            receiver: RoleId::manager(),
            content: Payload::goal(text),
        }
    }

    #[test]
    fn normalizes_model_answers() {
        assert_eq!(normalize_answer("  canvas_expert\n"), "canvas_expert");
        assert_eq!(normalize_answer("\"Scene_Expert\"."), "scene_expert");
        assert_eq!(normalize_answer("```\ncanvas_expert\n```"), "canvas_expert");
        assert_eq!(
            normalize_answer("<think>a 2D shape</think>\n`canvas_expert`"),
            "canvas_expert"
        );
    }

    #[tokio::test]
    async fn routes_goal_as_task_to_classified_expert() {
        let bus = MessageBus::new();
        let (manager, model) = manager(&["canvas_expert"]);
        let (expert, mut inbox) = InboxAgent::new(ExpertKind::Canvas);
        bus.register(manager.clone());
        bus.register(expert);

        bus.dispatch(goal("Draw a red square")).completion().await.unwrap();

        let task = inbox.next().await;
        assert_eq!(task.sender, RoleId::manager());
        assert_eq!(task.content, Payload::task("Draw a red square"));

        let prompts = model.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Draw a red square"));
        assert!(prompts[0].contains("canvas_expert, scene_expert"));
    }

    #[tokio::test]
    async fn unknown_expert_is_reported_to_ui() {
        let bus = MessageBus::new();
        let (manager, _) = manager(&["browser_expert"]);
        let (ui, mut ui_inbox) = InboxAgent::new(RoleId::ui());
        bus.register(manager);
        bus.register(ui);

        let result = bus.dispatch(goal("Open a website")).completion().await;

        assert!(matches!(result, Err(AgentError::Classification { answer }) if answer == "browser_expert"));
        match ui_inbox.next().await.content {
            Payload::Status(report) => {
                assert_eq!(report.status, TaskStatus::Error);
                assert!(report.error.unwrap().contains("browser_expert"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn unregistered_expert_is_a_classification_error() {
        let bus = MessageBus::new();
        let (manager, _) = manager(&["scene_expert"]);
        let (ui, mut ui_inbox) = InboxAgent::new(RoleId::ui());
        bus.register(manager);
        bus.register(ui);

        let result = bus.dispatch(goal("A spinning cube")).completion().await;

        assert!(matches!(result, Err(AgentError::Classification { .. })));
        assert!(matches!(ui_inbox.next().await.content, Payload::Status(r) if !r.is_complete()));
    }

    #[tokio::test]
    async fn expert_outside_configured_set_is_rejected() {
        let bus = MessageBus::new();
        let model = Arc::new(ScriptedModel::new(["scene_expert"]));
        let manager = Arc::new(ManagerAgent::new(model, vec![ExpertKind::Canvas]));
        let (scene, mut scene_inbox) = InboxAgent::new(ExpertKind::Scene);
        bus.register(manager.clone());
        bus.register(scene);

        let result = manager.classify("A cube").await;

        assert!(matches!(result, Err(AgentError::Classification { .. })));
        assert!(scene_inbox.try_next().is_none());
    }

    #[tokio::test]
    async fn classification_errors_carry_normalized_answer() {
        let bus = MessageBus::new();
        let (manager, _) = manager(&["\"Browser_Expert\".", "```\nScene_Expert\n```"]);
        bus.register(manager.clone());

        let unknown = manager.classify("Open a website").await;
        let unregistered = manager.classify("A spinning cube").await;

        assert!(matches!(unknown, Err(AgentError::Classification { answer }) if answer == "browser_expert"));
        assert!(matches!(unregistered, Err(AgentError::Classification { answer }) if answer == "scene_expert"));
    }

    #[tokio::test]
    async fn relays_simplified_status_to_ui() {
        let bus = MessageBus::new();
        let (manager, _) = manager(&[]);
        let (ui, mut ui_inbox) = InboxAgent::new(RoleId::ui());
        bus.register(manager);
        bus.register(ui);

        bus.dispatch(Message {
            sender: ExpertKind::Canvas.role(),
            receiver: RoleId::manager(),
            content: StatusReport::complete(Some("Draw a red square".to_string())).into(),
        })
        .completion()
        .await
        .unwrap();

        let relayed = ui_inbox.next().await;
        assert_eq!(relayed.sender, RoleId::manager());
        assert_eq!(relayed.content.to_json(), r#"{"status":"complete"}"#);

        bus.dispatch(Message {
            sender: ExpertKind::Scene.role(),
            receiver: RoleId::manager(),
            content: StatusReport::error(None, "bad plan").into(),
        })
        .completion()
        .await
        .unwrap();

        assert_eq!(
            ui_inbox.next().await.content.to_json(),
            r#"{"status":"error","error":"bad plan"}"#
        );
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let bus = MessageBus::new();
        let (manager, _) = manager(&[]);
        let (ui, mut ui_inbox) = InboxAgent::new(RoleId::ui());
        bus.register(manager);
        bus.register(ui);

        let result = bus.dispatch(goal("Draw")).completion().await;

        assert!(matches!(result, Err(AgentError::LlmError(_))));
        assert!(matches!(ui_inbox.next().await.content, Payload::Status(_)));
    }
}
