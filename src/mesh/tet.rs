use nalgebra::Point3;
use std::collections::HashMap;

use super::quality::{assess_mesh_quality, MeshQuality};
use super::{PolyhedralMesh, TetElement};
use crate::error::{ModalError, Result};
use crate::geometry::Aabb;

/// Tetrahedral volume mesh
///
/// Points are indexed contiguously from 0 and every element has positive
/// volume. The boundary triangulation (faces seen by exactly one element,
/// outward winding) is derived once at construction. Meshes are replaced
/// wholesale, never edited in place.
#[derive(Debug, Clone, Default)]
pub struct VolumetricMesh {
    pub points: Vec<Point3<f64>>,
    pub tets: Vec<TetElement>,
    boundary: Vec<[usize; 3]>,
}

impl VolumetricMesh {
    /// Build from raw tetrahedralizer output
    ///
    /// Elements are reoriented to positive volume, degenerate elements
    /// (|volume| below `1e-12` × bounding-box volume) are dropped and points
    /// no element references are removed.
    pub fn from_tetrahedra(points: Vec<Point3<f64>>, tets: Vec<[usize; 4]>) -> Result<Self> {
        let n = points.len();
        if let Some(bad) = tets.iter().flatten().find(|&&i| i >= n) {
            return Err(ModalError::TetrahedralizationFailed(format!(
                "element references point {} of {}",
                bad, n
            )));
        }

        let scale = Aabb::from_points(&points).map(|b| b.volume()).unwrap_or(0.0);
        let min_volume = 1e-12 * scale;

        let mut kept = Vec::with_capacity(tets.len());
        let mut dropped = 0usize;
        for nodes in tets {
            let mut elem = TetElement::new(nodes);
            let vol = elem.signed_volume(&points);
            if vol.abs() <= min_volume {
                dropped += 1;
                continue;
            }
            if vol < 0.0 {
                elem.flip();
            }
            kept.push(elem);
        }
        if dropped > 0 {
            log::debug!("dropped {} degenerate tetrahedra", dropped);
        }
        if kept.is_empty() {
            return Err(ModalError::TetrahedralizationFailed(
                "no tetrahedra with positive volume".to_string(),
            ));
        }

        let (points, tets) = compact(points, kept);
        Ok(Self::from_parts_unchecked(points, tets))
    }

    /// Box `[0,lx]×[0,ly]×[0,lz]` split into `nx×ny×nz` cells of six
    /// tetrahedra around each cell's main diagonal
    ///
    /// Nodes are numbered x-fastest: `ix + (nx+1)·(iy + (ny+1)·iz)`.
    pub fn structured_box(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Result<Self> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(ModalError::InvalidParameters(format!(
                "box needs at least one cell per axis, got {}x{}x{}",
                nx, ny, nz
            )));
        }
        let (dx, dy, dz) = (lx / nx as f64, ly / ny as f64, lz / nz as f64);
        let node = |ix: usize, iy: usize, iz: usize| ix + (nx + 1) * (iy + (ny + 1) * iz);

        let mut points = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
        for iz in 0..=nz {
            for iy in 0..=ny {
                for ix in 0..=nx {
                    points.push(Point3::new(ix as f64 * dx, iy as f64 * dy, iz as f64 * dz));
                }
            }
        }

        // Corners 1..7 visited in a ring around the 0-6 diagonal
        const RING: [usize; 7] = [1, 2, 3, 7, 4, 5, 1];
        let mut tets = Vec::with_capacity(6 * nx * ny * nz);
        for iz in 0..nz {
            for iy in 0..ny {
                for ix in 0..nx {
                    let c = [
                        node(ix, iy, iz),
                        node(ix + 1, iy, iz),
                        node(ix + 1, iy + 1, iz),
                        node(ix, iy + 1, iz),
                        node(ix, iy, iz + 1),
                        node(ix + 1, iy, iz + 1),
                        node(ix + 1, iy + 1, iz + 1),
                        node(ix, iy + 1, iz + 1),
                    ];
                    for w in RING.windows(2) {
                        tets.push([c[0], c[w[0]], c[w[1]], c[6]]);
                    }
                }
            }
        }
        Self::from_tetrahedra(points, tets)
    }

    /// Assemble without validation; boundary faces are still derived
    pub fn from_parts_unchecked(points: Vec<Point3<f64>>, tets: Vec<TetElement>) -> Self {
        let boundary = extract_boundary(&tets);
        Self {
            points,
            tets,
            boundary,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.points.len()
    }

    pub fn num_tetrahedra(&self) -> usize {
        self.tets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tets.is_empty()
    }

    /// Boundary triangles with outward winding
    pub fn boundary_faces(&self) -> &[[usize; 3]] {
        &self.boundary
    }

    pub fn total_volume(&self) -> f64 {
        self.tets.iter().map(|t| t.signed_volume(&self.points)).sum()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.points)
    }

    pub fn quality(&self) -> MeshQuality {
        assess_mesh_quality(self)
    }

    /// Indices of points on the boundary, sorted
    pub fn boundary_vertices(&self) -> Vec<usize> {
        let mut on_boundary = vec![false; self.points.len()];
        for f in &self.boundary {
            for &i in f {
                on_boundary[i] = true;
            }
        }
        on_boundary
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    /// Boundary surface for rendering
    ///
    /// Keeps every point so vertex indices match the volume mesh; interior
    /// points are simply not referenced by any face.
    pub fn to_polyhedral(&self) -> PolyhedralMesh {
        let faces = self.boundary.iter().map(|f| f.to_vec()).collect();
        // Boundary faces come from validated elements, so this cannot fail
        PolyhedralMesh::from_faces(self.points.clone(), faces).unwrap_or_default()
    }
}

/// Faces that belong to exactly one element, with that element's winding
fn extract_boundary(tets: &[TetElement]) -> Vec<[usize; 3]> {
    let mut faces: HashMap<[usize; 3], ([usize; 3], usize)> = HashMap::new();
    for tet in tets {
        for face in tet.faces() {
            let mut key = face;
            key.sort_unstable();
            faces.entry(key).or_insert((face, 0)).1 += 1;
        }
    }
    let mut boundary: Vec<[usize; 3]> = faces
        .into_values()
        .filter(|(_, count)| *count == 1)
        .map(|(face, _)| face)
        .collect();
    // Hash order is not stable across runs
    boundary.sort_unstable();
    boundary
}

/// Drop unreferenced points, keeping the survivors in their original order
fn compact(points: Vec<Point3<f64>>, mut tets: Vec<TetElement>) -> (Vec<Point3<f64>>, Vec<TetElement>) {
    let mut used = vec![false; points.len()];
    for tet in &tets {
        for &node in &tet.nodes {
            used[node] = true;
        }
    }
    let mut remap = vec![usize::MAX; points.len()];
    let mut compacted = Vec::with_capacity(points.len());
    for (i, p) in points.into_iter().enumerate() {
        if used[i] {
            remap[i] = compacted.len();
            compacted.push(p);
        }
    }
    for tet in &mut tets {
        for node in &mut tet.nodes {
            *node = remap[*node];
        }
    }
    (compacted, tets)
}
