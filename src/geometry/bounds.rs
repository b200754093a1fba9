use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Bounds of a point set, `None` when the set is empty
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let bounds = iter.fold(Self::new(first, first), |mut acc, p| {
            acc.min = Point3::new(acc.min.x.min(p.x), acc.min.y.min(p.y), acc.min.z.min(p.z));
            acc.max = Point3::new(acc.max.x.max(p.x), acc.max.y.max(p.y), acc.max.z.max(p.z));
            acc
        });
        Some(bounds)
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    pub fn volume(&self) -> f64 {
        let e = self.extent();
        e.x * e.y * e.z
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds_of_points() {
        let pts = [
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(-1.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        let b = Aabb::from_points(&pts).unwrap();
        assert_eq!(b.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Point3::new(1.0, 3.0, 2.0));
        assert_relative_eq!(b.center().y, 0.5);
        assert!(b.contains(&Point3::new(0.0, 0.0, 1.0)));
        assert!(!b.contains(&Point3::new(0.0, 4.0, 1.0)));
    }

    #[test]
    fn test_empty_point_set_has_no_bounds() {
        let pts: Vec<Point3<f64>> = Vec::new();
        assert!(Aabb::from_points(&pts).is_none());
    }
}
