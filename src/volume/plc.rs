/// Piecewise-linear complex handed to the tetrahedralizer
///
/// Wraps a closed triangulated surface: deduplicated vertices plus one
/// triangular facet per surface triangle.

use nalgebra::Point3;
use rayon::prelude::*;
use std::collections::HashMap;

use crate::error::{ModalError, Result};
use crate::geometry::Aabb;
use crate::mesh::PolyhedralMesh;

#[derive(Debug, Clone)]
pub struct Plc {
    pub points: Vec<Point3<f64>>,
    pub facets: Vec<[usize; 3]>,
    bounds: Aabb,
}

impl Plc {
    /// Build from vertex/triangle arrays
    ///
    /// Vertices closer than `1e-9` × bounding diagonal are merged and
    /// triangles that collapse are dropped. Fails unless the remaining
    /// surface is closed (every edge shared by exactly two facets) with at
    /// least 4 vertices and 4 facets.
    pub fn from_surface(vertices: &[Point3<f64>], triangles: &[[usize; 3]]) -> Result<Self> {
        let bounds = Aabb::from_points(vertices)
            .ok_or_else(|| ModalError::TetrahedralizationFailed("surface has no vertices".to_string()))?;
        let tolerance = 1e-9 * bounds.diagonal().max(f64::MIN_POSITIVE);

        let mut points: Vec<Point3<f64>> = Vec::new();
        let mut vertex_map: HashMap<(i64, i64, i64), usize> = HashMap::new();
        let mut remap = vec![usize::MAX; vertices.len()];
        let mut facets = Vec::with_capacity(triangles.len());

        for tri in triangles {
            let mut face = [0usize; 3];
            for (k, &vi) in tri.iter().enumerate() {
                let v = vertices.get(vi).ok_or_else(|| {
                    ModalError::TetrahedralizationFailed(format!("triangle references vertex {}", vi))
                })?;
                if remap[vi] == usize::MAX {
                    let key = quantize(v, tolerance);
                    remap[vi] = *vertex_map.entry(key).or_insert_with(|| {
                        points.push(*v);
                        points.len() - 1
                    });
                }
                face[k] = remap[vi];
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                continue;
            }
            let area2 = (points[face[1]] - points[face[0]])
                .cross(&(points[face[2]] - points[face[0]]))
                .norm();
            if area2 <= tolerance * tolerance {
                continue;
            }
            facets.push(face);
        }

        log::debug!(
            "plc: {} unique vertices, {} facets (from {} / {})",
            points.len(),
            facets.len(),
            vertices.len(),
            triangles.len()
        );

        if points.len() < 4 || facets.len() < 4 {
            return Err(ModalError::TetrahedralizationFailed(
                "too few vertices/facets for tetrahedralization".to_string(),
            ));
        }

        let plc = Self {
            points,
            facets,
            bounds,
        };
        if let Some((a, b, count)) = plc.first_open_edge() {
            return Err(ModalError::TetrahedralizationFailed(format!(
                "surface is not closed: edge {}-{} is used by {} facets",
                a, b, count
            )));
        }
        Ok(plc)
    }

    pub fn from_mesh(mesh: &PolyhedralMesh) -> Result<Self> {
        Self::from_surface(mesh.vertices(), &mesh.triangles())
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// First edge not shared by exactly two facets, sorted for determinism
    fn first_open_edge(&self) -> Option<(usize, usize, usize)> {
        let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
        for f in &self.facets {
            for k in 0..3 {
                let (a, b) = (f[k], f[(k + 1) % 3]);
                *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        edges
            .into_iter()
            .filter(|(_, count)| *count != 2)
            .map(|((a, b), count)| (a, b, count))
            .min()
    }

    /// Generalised winding number of the surface around `p`
    ///
    /// ±1 inside a closed surface (sign follows facet orientation), 0 outside.
    pub fn winding_number(&self, p: &Point3<f64>) -> f64 {
        let total: f64 = self
            .facets
            .iter()
            .map(|f| {
                let a = self.points[f[0]] - p;
                let b = self.points[f[1]] - p;
                let c = self.points[f[2]] - p;
                let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
                let numerator = a.dot(&b.cross(&c));
                let denominator = la * lb * lc + a.dot(&b) * lc + b.dot(&c) * la + c.dot(&a) * lb;
                2.0 * numerator.atan2(denominator)
            })
            .sum();
        total / (4.0 * std::f64::consts::PI)
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        self.winding_number(p).abs() > 0.5
    }

    /// Inside test for many points at once
    pub fn contains_all(&self, points: &[Point3<f64>]) -> Vec<bool> {
        points.par_iter().map(|p| self.contains(p)).collect()
    }

    /// Mean facet edge length
    pub fn mean_edge_length(&self) -> f64 {
        let sum: f64 = self
            .facets
            .iter()
            .map(|f| {
                (0..3)
                    .map(|k| (self.points[f[k]] - self.points[f[(k + 1) % 3]]).norm())
                    .sum::<f64>()
            })
            .sum();
        sum / (3 * self.facets.len()) as f64
    }
}

fn quantize(p: &Point3<f64>, tolerance: f64) -> (i64, i64, i64) {
    (
        (p.x / tolerance).round() as i64,
        (p.y / tolerance).round() as i64,
        (p.z / tolerance).round() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_split_vertices() {
        // Each triangle of the tetrahedron carries its own vertex copies
        let tet = PolyhedralMesh::tetrahedron(1.0);
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        for t in tet.triangles() {
            let base = vertices.len();
            vertices.extend(t.iter().map(|&i| tet.vertices()[i]));
            triangles.push([base, base + 1, base + 2]);
        }
        let plc = Plc::from_surface(&vertices, &triangles).unwrap();
        assert_eq!(plc.points.len(), 4);
        assert_eq!(plc.facets.len(), 4);
    }

    #[test]
    fn test_open_surface_rejected() {
        let cube = PolyhedralMesh::cube(1.0);
        let mut tris = cube.triangles();
        tris.pop();
        let err = Plc::from_surface(cube.vertices(), &tris).unwrap_err();
        assert!(matches!(err, ModalError::TetrahedralizationFailed(_)));
    }

    #[test]
    fn test_winding_number_inside_outside() {
        let plc = Plc::from_mesh(&PolyhedralMesh::cube(2.0)).unwrap();
        assert!((plc.winding_number(&Point3::origin()) - 1.0).abs() < 1e-9);
        assert!(plc.winding_number(&Point3::new(3.0, 0.0, 0.0)).abs() < 1e-9);
        assert!(plc.contains(&Point3::new(0.9, -0.9, 0.5)));
        assert!(!plc.contains(&Point3::new(1.1, 0.0, 0.0)));
    }
}
