/// Polyhedral surface mesh
///
/// Owns vertex positions and polygon faces (arbitrary valence, CCW winding)
/// and derives the flat buffers renderers and geometry algorithms consume.
/// Derived data (vertex normals, triangulated index buffer) is computed on
/// first request and dropped by every mutating operation.

use nalgebra::{Point3, Rotation3, Unit, Vector3};
use std::sync::OnceLock;

use crate::error::{ModalError, Result};
use crate::geometry::Aabb;

#[derive(Debug, Clone, Default)]
pub struct PolyhedralMesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<Vec<usize>>,
    normals: OnceLock<Vec<Vector3<f64>>>,
    triangles: OnceLock<Vec<[u32; 3]>>,
}

impl PolyhedralMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from polygons, validating every face
    ///
    /// A face must reference at least 3 distinct vertices, all in range.
    pub fn from_faces(vertices: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Result<Self> {
        for (fi, face) in faces.iter().enumerate() {
            validate_face(face, vertices.len())
                .map_err(|msg| ModalError::InvalidParameters(format!("face {}: {}", fi, msg)))?;
        }
        Ok(Self {
            vertices,
            faces,
            ..Self::default()
        })
    }

    pub fn from_triangles(vertices: Vec<Point3<f64>>, triangles: &[[usize; 3]]) -> Result<Self> {
        let faces = triangles.iter().map(|t| t.to_vec()).collect();
        Self::from_faces(vertices, faces)
    }

    /// Axis-aligned cube of edge `size` centred on the origin, quad faces
    pub fn cube(size: f64) -> Self {
        let h = 0.5 * size;
        let vertices = vec![
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];
        let faces = vec![
            vec![0, 3, 2, 1], // -z
            vec![4, 5, 6, 7], // +z
            vec![0, 1, 5, 4], // -y
            vec![2, 3, 7, 6], // +y
            vec![0, 4, 7, 3], // -x
            vec![1, 2, 6, 5], // +x
        ];
        Self {
            vertices,
            faces,
            ..Self::default()
        }
    }

    /// Regular tetrahedron inscribed in a cube of edge `size`
    pub fn tetrahedron(size: f64) -> Self {
        let h = 0.5 * size;
        let vertices = vec![
            Point3::new(h, h, h),
            Point3::new(h, -h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
        ];
        let faces = vec![vec![0, 1, 2], vec![0, 3, 1], vec![0, 2, 3], vec![1, 3, 2]];
        Self {
            vertices,
            faces,
            ..Self::default()
        }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangle_indices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.invalidate();
    }

    /// Whether vertex normals are currently available without recomputation
    pub fn has_normals(&self) -> bool {
        self.normals.get().is_some()
    }

    /// Install externally supplied normals (e.g. read from file)
    ///
    /// Ignored unless there is exactly one normal per vertex.
    pub fn set_normals(&mut self, normals: Vec<Vector3<f64>>) {
        if normals.len() != self.vertices.len() {
            log::debug!(
                "ignoring {} normals for {} vertices",
                normals.len(),
                self.vertices.len()
            );
            return;
        }
        self.normals = OnceLock::new();
        let _ = self.normals.set(normals);
    }

    /// Per-vertex normals, computed on first use
    ///
    /// Each vertex gets the normalised sum of its incident face normals. Face
    /// normals come from Newell's formula, so larger faces weigh more.
    pub fn vertex_normals(&self) -> &[Vector3<f64>] {
        self.normals.get_or_init(|| {
            let mut normals = vec![Vector3::zeros(); self.vertices.len()];
            for face in &self.faces {
                let n = newell_normal(&self.vertices, face);
                for &vi in face {
                    normals[vi] += n;
                }
            }
            for n in &mut normals {
                let len = n.norm();
                if len > 1e-300 {
                    *n /= len;
                }
            }
            normals
        })
    }

    /// Triangulated index buffer (fan per polygon), computed on first use
    pub fn triangle_indices(&self) -> &[[u32; 3]] {
        self.triangles.get_or_init(|| {
            let mut tris = Vec::with_capacity(self.faces.len() * 2);
            for face in &self.faces {
                for k in 1..face.len() - 1 {
                    tris.push([face[0] as u32, face[k] as u32, face[k + 1] as u32]);
                }
            }
            tris
        })
    }

    /// Triangles as `usize` triples for geometry algorithms
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        self.triangle_indices()
            .iter()
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
            .collect()
    }

    /// Flat `xyz` position buffer
    pub fn positions_f32(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect()
    }

    /// Flat `xyz` normal buffer (computes normals if absent)
    pub fn normals_f32(&self) -> Vec<f32> {
        self.vertex_normals()
            .iter()
            .flat_map(|n| [n.x as f32, n.y as f32, n.z as f32])
            .collect()
    }

    pub fn indices_u32(&self) -> Vec<u32> {
        self.triangle_indices().iter().flatten().copied().collect()
    }

    pub fn compute_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Mean of the vertex positions
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.vertices.len() as f64))
    }

    /// Move the vertex centroid to the origin
    pub fn center(&mut self) {
        if let Some(c) = self.centroid() {
            self.translate(-c.coords);
        }
    }

    /// Move the bounding-box centre to the origin
    pub fn center_bounds(&mut self) {
        if let Some(b) = self.compute_bounds() {
            self.translate(-b.center().coords);
        }
    }

    pub fn translate(&mut self, offset: Vector3<f64>) {
        for v in &mut self.vertices {
            *v += offset;
        }
        self.invalidate_geometry();
    }

    /// Uniform scale about the origin
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() || factor == 0.0 {
            return Err(ModalError::InvalidParameters(format!(
                "scale factor must be finite and non-zero, got {}",
                factor
            )));
        }
        for v in &mut self.vertices {
            v.coords *= factor;
        }
        if factor < 0.0 {
            // Point reflection flips orientation; restore CCW winding
            for face in &mut self.faces {
                face.reverse();
            }
            self.invalidate();
        } else {
            self.invalidate_geometry();
        }
        Ok(())
    }

    /// Rotate about `axis` through the origin
    pub fn rotate(&mut self, axis: Vector3<f64>, degrees: f64) -> Result<()> {
        if axis.norm() < 1e-12 {
            return Err(ModalError::InvalidParameters("rotation axis is zero".to_string()));
        }
        let rot = Rotation3::from_axis_angle(&Unit::new_normalize(axis), degrees.to_radians());
        for v in &mut self.vertices {
            *v = rot * *v;
        }
        self.invalidate_geometry();
        Ok(())
    }

    /// Mirror across the XZ plane (y → -y), keeping outward winding
    pub fn mirror_y(&mut self) {
        for v in &mut self.vertices {
            v.y = -v.y;
        }
        for face in &mut self.faces {
            face.reverse();
        }
        self.invalidate();
    }

    /// Signed volume enclosed by the surface (positive for outward winding)
    pub fn enclosed_volume(&self) -> f64 {
        self.triangle_indices()
            .iter()
            .map(|t| {
                let a = self.vertices[t[0] as usize].coords;
                let b = self.vertices[t[1] as usize].coords;
                let c = self.vertices[t[2] as usize].coords;
                a.dot(&b.cross(&c))
            })
            .sum::<f64>()
            / 6.0
    }

    // Positions changed but topology did not
    fn invalidate_geometry(&mut self) {
        self.normals = OnceLock::new();
    }

    fn invalidate(&mut self) {
        self.normals = OnceLock::new();
        self.triangles = OnceLock::new();
    }
}

fn validate_face(face: &[usize], num_vertices: usize) -> std::result::Result<(), String> {
    if face.len() < 3 {
        return Err(format!("has {} vertices, need at least 3", face.len()));
    }
    if let Some(&bad) = face.iter().find(|&&i| i >= num_vertices) {
        return Err(format!("vertex index {} out of range ({} vertices)", bad, num_vertices));
    }
    for (i, a) in face.iter().enumerate() {
        if face[i + 1..].contains(a) {
            return Err(format!("repeats vertex {}", a));
        }
    }
    Ok(())
}

/// Area-weighted polygon normal (Newell's method, magnitude = 2 × area)
pub(crate) fn newell_normal(vertices: &[Point3<f64>], face: &[usize]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for (k, &i) in face.iter().enumerate() {
        let a = vertices[i];
        let b = vertices[face[(k + 1) % face.len()]];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_degenerate_faces() {
        let verts = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        assert!(PolyhedralMesh::from_faces(verts.clone(), vec![vec![0, 1]]).is_err());
        assert!(PolyhedralMesh::from_faces(verts.clone(), vec![vec![0, 1, 1]]).is_err());
        assert!(PolyhedralMesh::from_faces(verts.clone(), vec![vec![0, 1, 3]]).is_err());
        assert!(PolyhedralMesh::from_faces(verts, vec![vec![0, 1, 2]]).is_ok());
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let cube = PolyhedralMesh::cube(2.0);
        let normals = cube.vertex_normals();
        assert_eq!(normals.len(), cube.num_vertices());
        for (p, n) in cube.vertices().iter().zip(normals) {
            // Corner normals point along the corner diagonal
            assert!(p.coords.dot(n) > 0.0);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cube_triangulation_and_volume() {
        let cube = PolyhedralMesh::cube(2.0);
        assert_eq!(cube.num_triangles(), 12);
        assert_relative_eq!(cube.enclosed_volume(), 8.0, epsilon = 1e-12);
        assert_relative_eq!(PolyhedralMesh::tetrahedron(2.0).enclosed_volume(), 8.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transforms_invalidate_normals() {
        let mut cube = PolyhedralMesh::cube(1.0);
        let before = cube.vertex_normals()[0];
        assert!(cube.has_normals());
        cube.rotate(Vector3::z(), 90.0).unwrap();
        assert!(!cube.has_normals());

        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), 90f64.to_radians()) * before;
        assert_relative_eq!(cube.vertex_normals()[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_center_moves_centroid_to_origin() {
        let mut cube = PolyhedralMesh::cube(1.0);
        cube.translate(Vector3::new(3.0, -2.0, 5.0));
        cube.center();
        let c = cube.centroid().unwrap();
        assert_relative_eq!(c.coords.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_scale_keeps_outward_winding() {
        let mut cube = PolyhedralMesh::cube(1.0);
        cube.scale(-2.0).unwrap();
        assert_relative_eq!(cube.enclosed_volume(), 8.0, epsilon = 1e-12);
        assert!(cube.scale(0.0).is_err());
    }

    #[test]
    fn test_mirror_y_keeps_volume_positive() {
        let mut tet = PolyhedralMesh::tetrahedron(1.0);
        tet.mirror_y();
        assert!(tet.enclosed_volume() > 0.0);
    }
}
