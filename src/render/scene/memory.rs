use std::collections::BTreeMap;

use serde::Serialize;

use super::{NodeKey, SceneGraph, SceneNode, Vec3};

#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub nodes: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotNode {
    pub key: NodeKey,
    #[serde(flatten)]
    pub node: SceneNode,
}

/// Scene graph kept in memory, nodes in insertion order
#[derive(Debug, Default)]
pub struct InMemoryScene {
    nodes: BTreeMap<NodeKey, SceneNode>,
    next_key: u64,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            nodes: self
                .nodes
                .iter()
                .map(|(key, node)| SnapshotNode {
                    key: *key,
                    node: node.clone(),
                })
                .collect(),
        }
    }
}

impl SceneGraph for InMemoryScene {
    fn add(&mut self, node: SceneNode) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(key, node);
        key
    }

    fn remove(&mut self, key: NodeKey) -> Option<SceneNode> {
        self.nodes.remove(&key)
    }

    fn keys(&self) -> Vec<NodeKey> {
        self.nodes.keys().copied().collect()
    }

    fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(&key)
    }

    fn set_position(&mut self, key: NodeKey, position: Vec3) -> bool {
        match self.nodes.get_mut(&key) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    fn set_rotation(&mut self, key: NodeKey, rotation: Vec3) -> bool {
        match self.nodes.get_mut(&key) {
            Some(node) => {
                node.rotation = rotation;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scene::{Color, Light, LightKind, NodeKind};

    fn light() -> SceneNode {
        SceneNode::new(NodeKind::Light(Light {
            kind: LightKind::Ambient,
            color: Color::default(),
            intensity: 1.0,
        }))
    }

    #[test]
    fn keys_are_never_reused() {
        let mut scene = InMemoryScene::new();
        let first = scene.add(light());
        scene.remove(first);
        let second = scene.add(light());

        assert_ne!(first, second);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn set_position_on_missing_node_is_reported() {
        let mut scene = InMemoryScene::new();
        let key = scene.add(light());

        assert!(scene.set_position(key, Vec3::new(1.0, 2.0, 3.0)));
        assert!(!scene.set_position(NodeKey(99), Vec3::default()));
        assert_eq!(scene.node(key).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
    }
}
