/// Scene graph for grouped mesh instances
///
/// Each node stores its transform relative to its parent; the absolute
/// transform is resolved on demand by walking up to the root.

use nalgebra::{Isometry3, Point3, Vector3};

use crate::error::{ModalError, Result};

/// Rigid motion followed by a uniform scale: x ↦ R(s·x) + t
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub isometry: Isometry3<f64>,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            isometry: Isometry3::identity(),
            scale: 1.0,
        }
    }

    pub fn new(isometry: Isometry3<f64>, scale: f64) -> Self {
        Self { isometry, scale }
    }

    pub fn from_translation(offset: Vector3<f64>) -> Self {
        Self::new(Isometry3::translation(offset.x, offset.y, offset.z), 1.0)
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.isometry.transform_point(&Point3::from(p.coords * self.scale))
    }

    /// Inverse mapping; `None` for a zero scale
    pub fn inverse_transform_point(&self, p: &Point3<f64>) -> Option<Point3<f64>> {
        if self.scale == 0.0 {
            return None;
        }
        let q = self.isometry.inverse_transform_point(p);
        Some(Point3::from(q.coords / self.scale))
    }

    /// `self ∘ child`: apply `child` first, then `self`
    pub fn then_child(&self, child: &Transform) -> Transform {
        let rotated = self.isometry.rotation * (child.isometry.translation.vector * self.scale);
        let translation = self.isometry.translation.vector + rotated;
        Transform {
            isometry: Isometry3::from_parts(
                translation.into(),
                self.isometry.rotation * child.isometry.rotation,
            ),
            scale: self.scale * child.scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub local: Transform,
    parent: Option<NodeId>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_node(&mut self, name: impl Into<String>, local: Transform) -> NodeId {
        self.nodes.push(SceneNode {
            name: name.into(),
            local,
            parent: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Add a node already attached under `parent`
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, local: Transform) -> Result<NodeId> {
        self.check(parent)?;
        let id = self.add_node(name, local);
        self.nodes[id.0].parent = Some(parent);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Re-parent `child`; rejects links that would close a cycle
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<()> {
        self.check(child)?;
        if let Some(p) = parent {
            self.check(p)?;
            let mut cursor = Some(p);
            while let Some(id) = cursor {
                if id == child {
                    return Err(ModalError::InvalidParameters(format!(
                        "making node {} the parent of {} would create a cycle",
                        p.0, child.0
                    )));
                }
                cursor = self.nodes[id.0].parent;
            }
        }
        self.nodes[child.0].parent = parent;
        Ok(())
    }

    /// Absolute transform of `id`
    pub fn world_transform(&self, id: NodeId) -> Result<Transform> {
        self.check(id)?;
        let mut world = self.nodes[id.0].local;
        let mut cursor = self.nodes[id.0].parent;
        while let Some(parent) = cursor {
            let node = &self.nodes[parent.0];
            world = node.local.then_child(&world);
            cursor = node.parent;
        }
        Ok(world)
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(ModalError::InvalidParameters(format!("unknown scene node {}", id.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_world_transform_composes_parents() {
        let mut scene = SceneGraph::new();
        let root = scene.add_node("root", Transform::from_translation(Vector3::new(10.0, 0.0, 0.0)).with_scale(2.0));
        let rot = Isometry3::from_parts(
            Vector3::new(0.0, 1.0, 0.0).into(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        );
        let child = scene.add_child(root, "child", Transform::new(rot, 1.0)).unwrap();

        let world = scene.world_transform(child).unwrap();
        let p = world.transform_point(&Point3::new(1.0, 0.0, 0.0));
        // child: (1,0,0) -> (0,1,0) + (0,1,0) = (0,2,0); root: *2 + (10,0,0)
        assert_relative_eq!(p, Point3::new(10.0, 4.0, 0.0), epsilon = 1e-12);

        let back = world.inverse_transform_point(&p).unwrap();
        assert_relative_eq!(back, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_cycles_rejected() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node("a", Transform::identity());
        let b = scene.add_child(a, "b", Transform::identity()).unwrap();
        let c = scene.add_child(b, "c", Transform::identity()).unwrap();
        assert!(scene.set_parent(a, Some(c)).is_err());
        assert!(scene.set_parent(a, Some(a)).is_err());
        assert!(scene.set_parent(c, None).is_ok());
        assert_eq!(scene.node(c).unwrap().parent(), None);
        assert_eq!(scene.find("b"), Some(b));
    }
}
