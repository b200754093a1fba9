use nalgebra::Point3;

use crate::scene::Transform;

/// Contact reported by the physics layer, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub world: Point3<f64>,
    /// Impulse magnitude (N·s)
    pub impulse: f64,
}

impl ContactPoint {
    pub fn new(world: Point3<f64>, impulse: f64) -> Self {
        Self { world, impulse }
    }

    /// Contact position in the mesh frame given the mesh's world transform
    pub fn local_point(&self, world: &Transform) -> Option<Point3<f64>> {
        world.inverse_transform_point(&self.world)
    }

    /// Strike intensity in [0, 1]
    pub fn intensity(&self, impulse_scale: f64) -> f64 {
        let v = self.impulse.abs() * impulse_scale;
        if v.is_finite() {
            v.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
