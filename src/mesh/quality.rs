/// Tetrahedral mesh quality assessment
///
/// Reports element Jacobians (six times the signed volume) so that
/// inverted and near-degenerate elements can be detected before they reach
/// the FEM assembly.

use nalgebra::Point3;
use rayon::prelude::*;

use super::{TetElement, VolumetricMesh};

/// Mesh quality statistics
#[derive(Debug, Clone)]
pub struct MeshQuality {
    /// Minimum Jacobian determinant (should be > 0)
    pub min_jacobian: f64,
    pub avg_jacobian: f64,
    pub max_jacobian: f64,
    /// Number of inverted elements (det(J) < 0)
    pub num_inverted: usize,
    /// Elements whose Jacobian is below `degenerate_ratio` × average
    pub num_degenerate: usize,
    /// Worst radius-edge ratio (circumradius / shortest edge)
    pub max_radius_edge: f64,
    pub total_elements: usize,
}

/// Relative Jacobian below which an element counts as degenerate
pub const DEGENERATE_RATIO: f64 = 1e-6;

impl MeshQuality {
    pub fn is_acceptable(&self) -> bool {
        self.total_elements > 0 && self.num_inverted == 0 && self.min_jacobian > 0.0
    }

    pub fn report(&self) -> String {
        format!(
            "Mesh Quality: min_J={:.3e}, avg_J={:.3e}, max_J={:.3e}, inverted={}/{}, degenerate={}/{}, max radius-edge={:.2}",
            self.min_jacobian,
            self.avg_jacobian,
            self.max_jacobian,
            self.num_inverted,
            self.total_elements,
            self.num_degenerate,
            self.total_elements,
            self.max_radius_edge
        )
    }
}

/// Compute Jacobian determinant for a tetrahedral element
///
/// ```text
/// J = [x1-x0  x2-x0  x3-x0]
///     [y1-y0  y2-y0  y3-y0]
///     [z1-z0  z2-z0  z3-z0]
/// ```
/// det(J) > 0: valid, det(J) = 0: zero volume, det(J) < 0: inverted
pub fn compute_tet_jacobian(vertices: &[Point3<f64>; 4]) -> f64 {
    let e1 = vertices[1] - vertices[0];
    let e2 = vertices[2] - vertices[0];
    let e3 = vertices[3] - vertices[0];
    e1.dot(&e2.cross(&e3))
}

/// Circumcentre and circumradius, `None` for a flat element
pub fn circumsphere(vertices: &[Point3<f64>; 4]) -> Option<(Point3<f64>, f64)> {
    let a = vertices[1] - vertices[0];
    let b = vertices[2] - vertices[0];
    let c = vertices[3] - vertices[0];
    let det = 2.0 * a.dot(&b.cross(&c));
    if det.abs() < 1e-300 {
        return None;
    }
    let offset = (b.cross(&c) * a.norm_squared()
        + c.cross(&a) * b.norm_squared()
        + a.cross(&b) * c.norm_squared())
        / det;
    Some((vertices[0] + offset, offset.norm()))
}

/// Circumradius divided by the shortest edge (√6/4 ≈ 0.61 for a regular tet)
pub fn radius_edge_ratio(vertices: &[Point3<f64>; 4]) -> f64 {
    let shortest = TetElement::LOCAL_EDGES
        .iter()
        .map(|&(i, j)| (vertices[i] - vertices[j]).norm())
        .fold(f64::INFINITY, f64::min);
    match circumsphere(vertices) {
        Some((_, r)) if shortest > 0.0 => r / shortest,
        _ => f64::INFINITY,
    }
}

/// Assess quality of every element (parallel above 1000 elements)
pub fn assess_mesh_quality(mesh: &VolumetricMesh) -> MeshQuality {
    let measure = |elem: &TetElement| {
        let corners = elem.corners(&mesh.points);
        (compute_tet_jacobian(&corners), radius_edge_ratio(&corners))
    };

    let results: Vec<(f64, f64)> = if mesh.tets.len() > 1000 {
        mesh.tets.par_iter().map(measure).collect()
    } else {
        mesh.tets.iter().map(measure).collect()
    };

    let total_elements = results.len();
    let mut min_jacobian = f64::INFINITY;
    let mut max_jacobian = f64::NEG_INFINITY;
    let mut sum_jacobian = 0.0;
    let mut max_radius_edge: f64 = 0.0;
    let mut num_inverted = 0;

    for &(det_j, ratio) in &results {
        if det_j < 0.0 {
            num_inverted += 1;
        }
        min_jacobian = min_jacobian.min(det_j);
        max_jacobian = max_jacobian.max(det_j);
        sum_jacobian += det_j;
        max_radius_edge = max_radius_edge.max(ratio);
    }

    let avg_jacobian = if total_elements > 0 {
        sum_jacobian / total_elements as f64
    } else {
        0.0
    };
    let num_degenerate = results
        .iter()
        .filter(|(det_j, _)| *det_j >= 0.0 && *det_j < DEGENERATE_RATIO * avg_jacobian)
        .count();

    MeshQuality {
        min_jacobian,
        avg_jacobian,
        max_jacobian,
        num_inverted,
        num_degenerate,
        max_radius_edge,
        total_elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tet() -> [Point3<f64>; 4] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_jacobian_of_unit_tet() {
        assert_relative_eq!(compute_tet_jacobian(&unit_tet()), 1.0);
    }

    #[test]
    fn test_circumsphere_of_unit_tet() {
        let (c, r) = circumsphere(&unit_tet()).unwrap();
        assert_relative_eq!(c, Point3::new(0.5, 0.5, 0.5), epsilon = 1e-12);
        assert_relative_eq!(r, 0.75f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_regular_tet_radius_edge() {
        let regular = [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
        ];
        assert_relative_eq!(radius_edge_ratio(&regular), 6f64.sqrt() / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_tet_has_no_circumsphere() {
        let mut flat = unit_tet();
        flat[3] = Point3::new(0.3, 0.3, 0.0);
        assert!(circumsphere(&flat).is_none());
        assert!(radius_edge_ratio(&flat).is_infinite());
    }

    #[test]
    fn test_quality_counts_inverted() {
        let points = unit_tet().to_vec();
        let mesh = VolumetricMesh::from_parts_unchecked(
            points,
            vec![TetElement::new([0, 1, 2, 3]), TetElement::new([0, 2, 1, 3])],
        );
        let q = assess_mesh_quality(&mesh);
        assert_eq!(q.total_elements, 2);
        assert_eq!(q.num_inverted, 1);
        assert!(!q.is_acceptable());
    }
}
