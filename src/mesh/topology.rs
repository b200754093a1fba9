use nalgebra::Point3;

/// A 4-node linear tetrahedron
///
/// Positively oriented elements satisfy
/// `(v1 - v0) · ((v2 - v0) × (v3 - v0)) > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TetElement {
    /// Global vertex indices
    pub nodes: [usize; 4],
}

impl TetElement {
    pub fn new(nodes: [usize; 4]) -> Self {
        Self { nodes }
    }

    /// Local faces with outward winding for a positively oriented element
    ///
    /// Face `i` is opposite local vertex `i`.
    pub const LOCAL_FACES: [[usize; 3]; 4] = [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]];

    /// Edges as pairs of local vertex indices
    pub const LOCAL_EDGES: [(usize, usize); 6] = [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)];

    /// Faces as global vertex triples, outward for positive orientation
    pub fn faces(&self) -> [[usize; 3]; 4] {
        Self::LOCAL_FACES.map(|f| [self.nodes[f[0]], self.nodes[f[1]], self.nodes[f[2]]])
    }

    pub fn corners(&self, points: &[Point3<f64>]) -> [Point3<f64>; 4] {
        self.nodes.map(|i| points[i])
    }

    /// Six times the signed volume
    pub fn jacobian(&self, points: &[Point3<f64>]) -> f64 {
        super::quality::compute_tet_jacobian(&self.corners(points))
    }

    pub fn signed_volume(&self, points: &[Point3<f64>]) -> f64 {
        self.jacobian(points) / 6.0
    }

    /// Swap two vertices so the element becomes positively oriented
    pub fn flip(&mut self) {
        self.nodes.swap(2, 3);
    }

    pub fn centroid(&self, points: &[Point3<f64>]) -> Point3<f64> {
        let c = self.corners(points);
        Point3::from((c[0].coords + c[1].coords + c[2].coords + c[3].coords) * 0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_faces_are_outward() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let tet = TetElement::new([0, 1, 2, 3]);
        assert_relative_eq!(tet.signed_volume(&pts), 1.0 / 6.0);
        let c = tet.centroid(&pts);
        for f in tet.faces() {
            let n = (pts[f[1]] - pts[f[0]]).cross(&(pts[f[2]] - pts[f[0]]));
            assert!(n.dot(&(pts[f[0]] - c)) > 0.0);
        }
    }

    #[test]
    fn test_flip_reverses_orientation() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let mut tet = TetElement::new([0, 1, 2, 3]);
        tet.flip();
        assert!(tet.signed_volume(&pts) < 0.0);
    }
}
