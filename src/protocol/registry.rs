use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::{self, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use super::command::CommandOutcome;
use super::errors::{CommandError, CommandResult};

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, CommandResult<CommandOutcome>> + Send + Sync>;

/// Identifies one rendering surface within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Verb-to-handler table for request/response command dispatch
///
/// Handlers are keyed by surface and verb, so two surfaces never collide on a
/// verb name. Registering a verb again replaces the previous handler for all
/// later requests. Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: Arc<RwLock<HashMap<(SurfaceId, String), Handler>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle bound to a single surface
    pub fn endpoint(&self, surface: SurfaceId) -> CommandEndpoint {
        CommandEndpoint {
            registry: self.clone(),
            surface,
        }
    }

    /// Register (or replace) the handler for a verb
    pub fn handle<F, Fut>(&self, surface: SurfaceId, verb: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult<CommandOutcome>> + Send + 'static,
    {
        let verb = verb.into();
        let handler: Handler = Arc::new(move |params| handler(params).boxed());

        debug!(%surface, verb = %verb, "Registered handler");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((surface, verb), handler);
    }

    /// Invoke the handler for a verb and await its result
    ///
    /// # Errors
    /// * `CommandError::HandlerNotFound` - nothing is registered for the verb
    /// * whatever the handler itself fails with
    pub async fn send_request(
        &self,
        surface: SurfaceId,
        verb: &str,
        params: Value,
    ) -> CommandResult<CommandOutcome> {
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(surface, verb.to_string()))
            .cloned();

        match handler {
            Some(handler) => {
                debug!(%surface, verb, "Invoking handler");
                handler(params).await
            }
            None => {
                error!(%surface, verb, "No handler found for method");
                Err(CommandError::HandlerNotFound {
                    surface,
                    verb: verb.to_string(),
                })
            }
        }
    }

    /// Verbs registered for a surface, sorted
    pub fn verbs(&self, surface: SurfaceId) -> Vec<String> {
        let mut verbs: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(s, _)| *s == surface)
            .map(|(_, verb)| verb.clone())
            .collect();
        verbs.sort();
        verbs
    }
}

/// A [`CommandRegistry`] scoped to one surface
#[derive(Clone)]
pub struct CommandEndpoint {
    registry: CommandRegistry,
    surface: SurfaceId,
}

impl CommandEndpoint {
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn handle<F, Fut>(&self, verb: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult<CommandOutcome>> + Send + 'static,
    {
        self.registry.handle(self.surface, verb, handler);
    }

    /// Register a handler whose params are deserialized into `P` first
    ///
    /// Params that do not fit `P` fail the request with
    /// `CommandError::InvalidParams`.
    pub fn handle_typed<P, F, Fut>(&self, verb: &str, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult<CommandOutcome>> + Send + 'static,
    {
        let name = verb.to_string();
        self.handle(verb, move |params: Value| {
            match serde_json::from_value::<P>(params) {
                Ok(parsed) => handler(parsed).boxed(),
                Err(source) => future::ready(Err(CommandError::InvalidParams {
                    verb: name.clone(),
                    source,
                }))
                .boxed(),
            }
        });
    }

    pub async fn send_request(&self, verb: &str, params: Value) -> CommandResult<CommandOutcome> {
        self.registry.send_request(self.surface, verb, params).await
    }

    pub fn verbs(&self) -> Vec<String> {
        self.registry.verbs(self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_verb_is_rejected() {
        let registry = CommandRegistry::new();
        let surface = SurfaceId::new();

        let result = registry.send_request(surface, "fill_rect", json!({})).await;

        assert!(matches!(
            result,
            Err(CommandError::HandlerNotFound { verb, .. }) if verb == "fill_rect"
        ));
    }

    #[tokio::test]
    async fn registered_handler_result_is_returned() {
        let endpoint = CommandRegistry::new().endpoint(SurfaceId::new());
        endpoint.handle("echo", |params: Value| async move {
            Ok(CommandOutcome::failed(params["msg"].as_str().unwrap_or_default().to_string()))
        });

        let outcome = endpoint.send_request("echo", json!({"msg": "hi"})).await.unwrap();
        assert_eq!(outcome, CommandOutcome::failed("hi"));
    }

    #[tokio::test]
    async fn reregistering_replaces_handler() {
        let endpoint = CommandRegistry::new().endpoint(SurfaceId::new());
        endpoint.handle("verb", |_| async { Ok(CommandOutcome::failed("first")) });
        let before = endpoint.send_request("verb", json!({})).await.unwrap();

        endpoint.handle("verb", |_| async { Ok(CommandOutcome::ok()) });
        let after = endpoint.send_request("verb", json!({})).await.unwrap();

        assert_eq!(before, CommandOutcome::failed("first"));
        assert_eq!(after, CommandOutcome::ok());
    }

    #[tokio::test]
    async fn surfaces_do_not_share_verbs() {
        let registry = CommandRegistry::new();
        let canvas = registry.endpoint(SurfaceId::new());
        let other = registry.endpoint(SurfaceId::new());
        canvas.handle("fill_rect", |_| async { Ok(CommandOutcome::ok()) });

        assert!(canvas.send_request("fill_rect", json!({})).await.is_ok());
        assert!(other.send_request("fill_rect", json!({})).await.is_err());
        assert_eq!(canvas.verbs(), vec!["fill_rect"]);
        assert!(other.verbs().is_empty());
    }

    #[derive(Deserialize)]
    struct Size {
        width: f64,
    }

    #[tokio::test]
    async fn typed_handler_rejects_bad_params() {
        let endpoint = CommandRegistry::new().endpoint(SurfaceId::new());
        endpoint.handle_typed("size", |size: Size| async move {
            assert!(size.width >= 0.0);
            Ok(CommandOutcome::ok())
        });

        assert!(endpoint.send_request("size", json!({"width": 3})).await.is_ok());
        assert!(matches!(
            endpoint.send_request("size", json!({"width": "wide"})).await,
            Err(CommandError::InvalidParams { .. })
        ));
    }
}
