//! Wiring of one agent session: bus, command registry, surfaces and agents.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch, Mutex};
use tracing::info;

use crate::agents::{
    AgentError, AgentResult, BatchPolicy, Delivery, ExpertAgent, ExpertKind, ExpertProfile,
    LogEntry, LoggerAgent, ManagerAgent, MessageBus, StatusReport, UiAgent,
};
use crate::llm::LanguageModel;
use crate::protocol::{CommandEndpoint, CommandRegistry, SurfaceId};
use crate::render::canvas::{install_canvas_server, CanvasSurface, SharedCanvas};
use crate::render::scene::{SceneCommandServer, SceneGraph, SharedScene};

pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Collects surfaces and settings, then builds a [`SwarmSession`]
///
/// Each installed surface gets its own [`SurfaceId`] and the matching
/// expert; installing a second surface of the same kind replaces the first.
pub struct SessionBuilder {
    model: Arc<dyn LanguageModel>,
    policy: BatchPolicy,
    log_capacity: usize,
    registry: CommandRegistry,
    surfaces: Vec<(ExpertKind, CommandEndpoint)>,
}

impl SessionBuilder {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            policy: BatchPolicy::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            registry: CommandRegistry::new(),
            surfaces: Vec::new(),
        }
    }

    pub fn batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_canvas<S: CanvasSurface>(mut self, canvas: SharedCanvas<S>) -> Self {
        let endpoint = self.surface_endpoint(ExpertKind::Canvas);
        install_canvas_server(&endpoint, canvas);
        self
    }

    pub fn with_scene<G: SceneGraph>(mut self, scene: SharedScene<G>) -> Self {
        let endpoint = self.surface_endpoint(ExpertKind::Scene);
        SceneCommandServer::install(&endpoint, scene);
        self
    }

    fn surface_endpoint(&mut self, kind: ExpertKind) -> CommandEndpoint {
        let endpoint = self.registry.endpoint(SurfaceId::new());
        self.surfaces.retain(|(existing, _)| *existing != kind);
        self.surfaces.push((kind, endpoint.clone()));
        endpoint
    }

    pub fn build(self) -> SwarmSession {
        let bus = MessageBus::new();
        let ui = Arc::new(UiAgent::new());
        let logger = Arc::new(LoggerAgent::new(self.log_capacity));
        bus.add_observer(logger.clone());
        bus.register(ui.clone());
        bus.register(logger.clone());

        let experts: Vec<ExpertKind> = self.surfaces.iter().map(|(kind, _)| *kind).collect();
        bus.register(Arc::new(ManagerAgent::new(
            Arc::clone(&self.model),
            experts.clone(),
        )));

        for (kind, endpoint) in self.surfaces {
            let expert = ExpertAgent::new(ExpertProfile::for_kind(kind), Arc::clone(&self.model), endpoint)
                .with_policy(self.policy);
            bus.register(Arc::new(expert));
        }

        info!(experts = ?experts, policy = ?self.policy, "Agent session ready");

        SwarmSession {
            bus,
            registry: self.registry,
            ui,
            logger,
            experts,
            in_flight: Arc::new(Mutex::new(())),
        }
    }
}

/// A running set of agents sharing one bus and one command registry
pub struct SwarmSession {
    bus: MessageBus,
    registry: CommandRegistry,
    ui: Arc<UiAgent>,
    logger: Arc<LoggerAgent>,
    experts: Vec<ExpertKind>,
    in_flight: Arc<Mutex<()>>,
}

impl SwarmSession {
    pub fn builder(model: Arc<dyn LanguageModel>) -> SessionBuilder {
        SessionBuilder::new(model)
    }

    /// Hand a goal to the manager without waiting for the outcome
    pub fn submit_goal(&self, goal: &str) -> AgentResult<Delivery> {
        self.ui.submit_goal(goal)
    }

    /// Submit a goal and wait for the status reported back to `ui`
    ///
    /// The goal stays in flight until its status arrives, even when this call
    /// has already given up waiting.
    ///
    /// # Errors
    /// * `AgentError::GoalInFlight` - an earlier goal has not reported yet
    /// * `AgentError::InvalidGoal` - the goal is blank
    /// * `AgentError::Timeout` - no status arrived in time; the goal is not
    ///   cancelled and may still finish later
    pub async fn run_goal(&self, goal: &str, timeout: Duration) -> AgentResult<StatusReport> {
        let guard = Arc::clone(&self.in_flight)
            .try_lock_owned()
            .map_err(|_| AgentError::GoalInFlight)?;

        let mut status = self.ui.subscribe();
        self.ui.submit_goal(goal)?;

        let (report_tx, report_rx) = oneshot::channel();
        tokio::spawn(async move {
            let report = next_status(&mut status).await;
            drop(guard);
            let _ = report_tx.send(report);
        });

        tokio::time::timeout(timeout, report_rx)
            .await
            .map_err(|_| AgentError::Timeout(timeout))?
            .map_err(|_| AgentError::BusClosed)?
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logger.entries()
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn experts(&self) -> &[ExpertKind] {
        &self.experts
    }

    pub fn latest_status(&self) -> Option<StatusReport> {
        self.ui.latest()
    }
}

async fn next_status(rx: &mut watch::Receiver<Option<StatusReport>>) -> AgentResult<StatusReport> {
    loop {
        rx.changed().await.map_err(|_| AgentError::BusClosed)?;
        if let Some(report) = rx.borrow_and_update().clone() {
            return Ok(report);
        }
    }
}
