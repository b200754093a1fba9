//! Geometry utilities supporting mesh preparation: bounds and convex hulls

pub mod bounds;
pub mod hull;

pub use bounds::Aabb;
pub use hull::convex_hull;
