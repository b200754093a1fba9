use nalgebra::Point3;
use parry3d_f64::na;
use parry3d_f64::transformation::try_convex_hull;

use crate::error::{ModalError, Result};
use crate::mesh::PolyhedralMesh;

use super::Aabb;

/// Convex hull of a point cloud as an outward-wound triangle mesh
///
/// Only hull vertices are kept in the output. Fewer than four points, or a
/// coplanar cloud, is `InvalidParameters`.
pub fn convex_hull(points: &[Point3<f64>]) -> Result<PolyhedralMesh> {
    let bounds = Aabb::from_points(points)
        .ok_or_else(|| ModalError::InvalidParameters("convex hull of no points".to_string()))?;
    let eps = 1e-10 * bounds.diagonal().max(1e-300);
    if initial_simplex(points, eps).is_none() {
        return Err(ModalError::InvalidParameters(
            "convex hull needs 4 non-coplanar points".to_string(),
        ));
    }

    let input: Vec<na::Point3<f64>> = points
        .iter()
        .map(|p| na::Point3::new(p.x, p.y, p.z))
        .collect();
    let (hull_points, hull_faces) = try_convex_hull(&input)
        .map_err(|e| ModalError::InvalidParameters(format!("convex hull failed: {:?}", e)))?;
    if hull_faces.is_empty() {
        return Err(ModalError::InvalidParameters(
            "convex hull produced no faces".to_string(),
        ));
    }

    let mut remap = vec![usize::MAX; hull_points.len()];
    let mut vertices = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::with_capacity(hull_faces.len());
    for face in &hull_faces {
        let tri = face.map(|i| {
            let i = i as usize;
            if remap[i] == usize::MAX {
                remap[i] = vertices.len();
                let p = hull_points[i];
                vertices.push(Point3::new(p.x, p.y, p.z));
            }
            remap[i]
        });
        triangles.push(tri);
    }

    // Outward winding gives a positive signed volume
    let signed: f64 = triangles
        .iter()
        .map(|t| {
            vertices[t[0]]
                .coords
                .dot(&vertices[t[1]].coords.cross(&vertices[t[2]].coords))
        })
        .sum();
    if signed < 0.0 {
        for t in &mut triangles {
            t.swap(1, 2);
        }
    }

    log::debug!(
        "convex hull: {} input points, {} hull vertices, {} faces",
        points.len(),
        vertices.len(),
        triangles.len()
    );
    PolyhedralMesh::from_triangles(vertices, &triangles)
}

fn initial_simplex(points: &[Point3<f64>], eps: f64) -> Option<[usize; 4]> {
    let p0 = 0;
    let p1 = farthest(points, |p| (p - points[p0]).norm())?;
    if (points[p1] - points[p0]).norm() <= eps {
        return None;
    }
    let axis = (points[p1] - points[p0]).normalize();
    let p2 = farthest(points, |p| {
        let d = p - points[p0];
        (d - axis * d.dot(&axis)).norm()
    })?;
    let normal = axis.cross(&(points[p2] - points[p0]));
    if normal.norm() <= eps {
        return None;
    }
    let normal = normal.normalize();
    let p3 = farthest(points, |p| normal.dot(&(p - points[p0])).abs())?;
    if normal.dot(&(points[p3] - points[p0])).abs() <= eps {
        return None;
    }
    Some([p0, p1, p2, p3])
}

fn farthest<F>(points: &[Point3<f64>], metric: F) -> Option<usize>
where
    F: Fn(&Point3<f64>) -> f64,
{
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, metric(p)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hull_of_cube_with_interior_points() {
        let mut points = PolyhedralMesh::cube(2.0).vertices().to_vec();
        points.push(Point3::new(0.1, 0.2, -0.3));
        points.push(Point3::origin());
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.num_vertices(), 8);
        assert_eq!(hull.num_faces(), 12);
        assert_relative_eq!(hull.enclosed_volume(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_coplanar_points_rejected() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert!(convex_hull(&points).is_err());
        assert!(convex_hull(&[]).is_err());
        assert!(convex_hull(&points[..3]).is_err());
    }

    #[test]
    fn test_hull_is_outward_wound() {
        let mut points = PolyhedralMesh::tetrahedron(1.0).vertices().to_vec();
        points.push(Point3::new(5.0, 5.0, 5.0));
        let hull = convex_hull(&points).unwrap();
        assert!(hull.enclosed_volume() > 0.0);
        assert_eq!(hull.num_faces(), 2 * hull.num_vertices() - 4);
    }
}
