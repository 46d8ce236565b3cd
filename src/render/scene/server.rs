use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{
    Color, Geometry, Light, LightKind, Material, MaterialKind, NodeKey, NodeKind, SceneGraph,
    SceneNode, SharedScene, Vec3,
};
use crate::protocol::{CommandEndpoint, CommandOutcome, CommandResult};

/// Prefix shared by every scene verb
pub const SCENE_NAMESPACE: &str = "scene/";

type ObjectTable = Arc<Mutex<HashMap<String, NodeKey>>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMeshParams {
    id: Option<String>,
    geometry: Option<String>,
    material: Option<String>,
    #[serde(default)]
    material_params: Value,
    position: Option<Vec3>,
    rotation: Option<Vec3>,
}

#[derive(Debug, Deserialize)]
struct SetPositionParams {
    id: String,
    position: Vec3,
}

#[derive(Debug, Deserialize)]
struct AddLightParams {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    color: Option<Color>,
    intensity: Option<f64>,
    position: Option<Vec3>,
}

#[derive(Debug, Deserialize)]
struct NoParams {}

/// Scene verb set: `clear_scene`, `create_mesh`, `set_position`, `add_light`
///
/// Created objects are remembered under the caller-supplied id so later
/// commands can address them. The table lives as long as the server and is
/// emptied by `clear_scene`.
pub struct SceneCommandServer<G> {
    scene: SharedScene<G>,
    objects: ObjectTable,
}

impl<G: SceneGraph> SceneCommandServer<G> {
    /// Install every scene verb on `endpoint`, namespaced with [`SCENE_NAMESPACE`]
    pub fn install(endpoint: &CommandEndpoint, scene: SharedScene<G>) -> Self {
        let server = Self {
            scene,
            objects: Arc::new(Mutex::new(HashMap::new())),
        };

        server.on(endpoint, "clear_scene", |graph: &mut G, objects, _: NoParams| {
            for key in graph.keys() {
                graph.remove(key);
            }
            objects.clear();
            Ok(CommandOutcome::ok())
        });

        server.on(endpoint, "create_mesh", |graph: &mut G, objects, p: CreateMeshParams| {
            let mut node = SceneNode::new(NodeKind::Mesh {
                geometry: Geometry::from_kind(p.geometry.as_deref()),
                material: Material {
                    kind: MaterialKind::from_kind(p.material.as_deref()),
                    params: p.material_params,
                },
            });
            if let Some(position) = p.position {
                node.position = position;
            }
            if let Some(rotation) = p.rotation {
                node.rotation = rotation;
            }

            let key = graph.add(node);
            match p.id {
                Some(id) => {
                    if objects.insert(id.clone(), key).is_some() {
                        debug!(id = %id, "Object id now refers to a new mesh");
                    }
                }
                None => debug!(?key, "Mesh created without an id"),
            }
            Ok(CommandOutcome::ok())
        });

        // unknown ids are an expected condition, reported in the outcome
        server.on(endpoint, "set_position", |graph: &mut G, objects, p: SetPositionParams| {
            let moved = objects
                .get(&p.id)
                .is_some_and(|key| graph.set_position(*key, p.position));

            if moved {
                Ok(CommandOutcome::ok())
            } else {
                warn!(id = %p.id, "set_position on unknown object");
                Ok(CommandOutcome::failed(format!(
                    "Object with id {} not found",
                    p.id
                )))
            }
        });

        server.on(endpoint, "add_light", |graph: &mut G, objects, p: AddLightParams| {
            let mut node = SceneNode::new(NodeKind::Light(Light {
                kind: LightKind::from_kind(p.kind.as_deref()),
                color: p.color.unwrap_or_default(),
                intensity: p.intensity.unwrap_or(1.0),
            }));
            if let Some(position) = p.position {
                node.position = position;
            }

            let key = graph.add(node);
            if let Some(id) = p.id {
                objects.insert(id, key);
            }
            Ok(CommandOutcome::ok())
        });

        server
    }

    /// Ids currently addressable by later commands, sorted
    pub async fn object_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn scene(&self) -> &SharedScene<G> {
        &self.scene
    }

    fn on<P, F>(&self, endpoint: &CommandEndpoint, verb: &str, apply: F)
    where
        P: serde::de::DeserializeOwned + Send + 'static,
        F: Fn(&mut G, &mut HashMap<String, NodeKey>, P) -> CommandResult<CommandOutcome>
            + Send
            + Sync
            + 'static,
    {
        let scene = Arc::clone(&self.scene);
        let objects = Arc::clone(&self.objects);
        let apply = Arc::new(apply);

        endpoint.handle_typed(&format!("{}{}", SCENE_NAMESPACE, verb), move |params: P| {
            let scene = Arc::clone(&scene);
            let objects = Arc::clone(&objects);
            let apply = Arc::clone(&apply);
            async move {
                // lock order: scene graph, then object table
                let mut graph = scene.lock().await;
                let mut table = objects.lock().await;
                apply(&mut *graph, &mut *table, params)
            }
        });
    }
}
