//! 3D scene graph surface and its command server.

mod memory;
mod server;

pub use memory::{InMemoryScene, SceneSnapshot, SnapshotNode};
pub use server::{SceneCommandServer, SCENE_NAMESPACE};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

/// Scene graph shared between its command server and whoever renders it
pub type SharedScene<G> = Arc<Mutex<G>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Constructible geometries; anything unrecognised becomes a unit box
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Box {
        width: f64,
        height: f64,
        depth: f64,
    },
    Sphere {
        radius: f64,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f64,
        height: f64,
    },
}

impl Geometry {
    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind.map(str::to_ascii_lowercase).as_deref() {
            Some("spheregeometry" | "sphere") => Geometry::Sphere {
                radius: 1.0,
                width_segments: 32,
                height_segments: 16,
            },
            Some("planegeometry" | "plane") => Geometry::Plane {
                width: 10.0,
                height: 10.0,
            },
            _ => Geometry::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Standard,
    Basic,
}

impl MaterialKind {
    /// Unrecognised kinds fall back to the standard material
    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind.map(str::to_ascii_lowercase).as_deref() {
            Some("meshbasicmaterial" | "basic") => MaterialKind::Basic,
            _ => MaterialKind::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub kind: MaterialKind,
    /// Passed through to the renderer untouched (color, roughness, ...)
    pub params: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
}

impl LightKind {
    /// Unrecognised kinds fall back to an ambient light
    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind.map(str::to_ascii_lowercase).as_deref() {
            Some("directionallight" | "directional") => LightKind::Directional,
            Some("pointlight" | "point") => LightKind::Point,
            _ => LightKind::Ambient,
        }
    }
}

/// Color given either as a number (`0xff0000`) or a CSS string (`"#ff0000"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Hex(u32),
    Css(String),
}

impl Default for Color {
    fn default() -> Self {
        Color::Hex(0xffffff)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeKind {
    Mesh { geometry: Geometry, material: Material },
    Light(Light),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub position: Vec3,
    pub rotation: Vec3,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            position: Vec3::default(),
            rotation: Vec3::default(),
        }
    }
}

/// Handle to a node inside a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeKey(pub u64);

/// Scene operations the command server relies on
pub trait SceneGraph: Send + 'static {
    fn add(&mut self, node: SceneNode) -> NodeKey;
    fn remove(&mut self, key: NodeKey) -> Option<SceneNode>;
    fn keys(&self) -> Vec<NodeKey>;
    fn node(&self, key: NodeKey) -> Option<&SceneNode>;

    /// Returns `false` when the node does not exist
    fn set_position(&mut self, key: NodeKey, position: Vec3) -> bool;
    /// Returns `false` when the node does not exist
    fn set_rotation(&mut self, key: NodeKey, rotation: Vec3) -> bool;
}
