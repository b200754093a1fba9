/// Surface to volume tetrahedralization
///
/// A closed triangulated surface is wrapped as a piecewise-linear complex
/// and filled with tetrahedra. The built-in backend is an incremental
/// Delaunay tetrahedralization carved to the surface interior; with the
/// `tetgen` feature the constrained Delaunay kernel from `tritet` is used
/// instead.

pub mod delaunay;
pub mod plc;
#[cfg(feature = "tetgen")]
mod tetgen;

pub use delaunay::Delaunay3;
pub use plc::Plc;

use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{ModalError, Result};
use crate::mesh::quality::{circumsphere, radius_edge_ratio};
use crate::mesh::{PolyhedralMesh, TetElement, VolumetricMesh};

/// Tetrahedralization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TetQuality {
    /// Only the surface vertices (`p`)
    #[default]
    Plain,
    /// Extra interior points for better shaped elements (`pq`)
    Quality,
}

impl TetQuality {
    /// Tetgen-style command switches for this mode
    pub fn switches(&self) -> &'static str {
        match self {
            TetQuality::Plain => "p",
            TetQuality::Quality => "pq",
        }
    }
}

/// Volume generator settings
///
/// The defaults are what `tetrahedralize` uses.
#[derive(Debug, Clone)]
pub struct VolumeGenerator {
    seed: u64,
    max_radius_edge: f64,
    refinement_rounds: usize,
    max_steiner_points: usize,
}

impl Default for VolumeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeGenerator {
    pub fn new() -> Self {
        Self {
            seed: 0x5eed,
            max_radius_edge: 2.0,
            refinement_rounds: 4,
            max_steiner_points: 4000,
        }
    }

    /// Seed for the tie-breaking perturbation
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_radius_edge(mut self, ratio: f64) -> Self {
        self.max_radius_edge = ratio;
        self
    }

    pub fn with_refinement_rounds(mut self, rounds: usize) -> Self {
        self.refinement_rounds = rounds;
        self
    }

    pub fn with_max_steiner_points(mut self, count: usize) -> Self {
        self.max_steiner_points = count;
        self
    }

    /// Tetrahedralize the interior of `plc`
    pub fn generate(&self, plc: &Plc, quality: TetQuality) -> Result<VolumetricMesh> {
        log::info!(
            "tetrahedralizing {} vertices / {} facets (switches \"{}\")",
            plc.points.len(),
            plc.facets.len(),
            quality.switches()
        );

        #[cfg(feature = "tetgen")]
        let mesh = match tetgen::generate(plc, quality) {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("tetgen failed ({}), falling back to built-in tetrahedralizer", e);
                self.generate_delaunay(plc, quality)?
            }
        };
        #[cfg(not(feature = "tetgen"))]
        let mesh = self.generate_delaunay(plc, quality)?;

        log::info!(
            "volume mesh: {} points, {} tetrahedra, volume {:.6e}",
            mesh.num_vertices(),
            mesh.num_tetrahedra(),
            mesh.total_volume()
        );
        log::debug!("{}", mesh.quality().report());
        Ok(mesh)
    }

    /// Built-in backend: Delaunay of the surface (plus Steiner) points,
    /// then keep the elements whose centroid lies inside the surface
    fn generate_delaunay(&self, plc: &Plc, quality: TetQuality) -> Result<VolumetricMesh> {
        let bounds = plc.bounds();
        let diag = bounds.diagonal();
        let jitter = 1e-7 * diag;
        let mut rng = StdRng::seed_from_u64(self.seed);

        // Insertion works on perturbed coordinates so that cospherical
        // inputs (grids, boxes) do not produce ambiguous cavities
        let mut dt = Delaunay3::new(&bounds);
        let mut points: Vec<Point3<f64>> = Vec::with_capacity(plc.points.len());
        let insert = |dt: &mut Delaunay3, points: &mut Vec<Point3<f64>>, p: Point3<f64>, rng: &mut StdRng| {
            let offset = Vector3::new(
                rng.gen_range(-jitter..=jitter),
                rng.gen_range(-jitter..=jitter),
                rng.gen_range(-jitter..=jitter),
            );
            if dt.insert(p + offset).is_some() {
                points.push(p);
                true
            } else {
                false
            }
        };

        for p in &plc.points {
            insert(&mut dt, &mut points, *p, &mut rng);
        }
        if points.len() < 4 {
            return Err(ModalError::TetrahedralizationFailed(
                "surface vertices could not be inserted".to_string(),
            ));
        }

        if quality == TetQuality::Quality {
            let steiner = self.steiner_grid(plc);
            let mut added = 0usize;
            for p in steiner {
                if insert(&mut dt, &mut points, p, &mut rng) {
                    added += 1;
                }
            }
            log::debug!("inserted {} interior grid points", added);

            let budget = 8 * plc.points.len();
            let mut refined = 0usize;
            for round in 0..self.refinement_rounds {
                let candidates = self.refinement_candidates(&dt, plc, budget - refined);
                if candidates.is_empty() {
                    break;
                }
                let mut inserted = 0usize;
                for c in candidates {
                    if insert(&mut dt, &mut points, c, &mut rng) {
                        inserted += 1;
                    }
                }
                refined += inserted;
                log::debug!("refinement round {}: {} circumcentres inserted", round + 1, inserted);
                if inserted == 0 || refined >= budget {
                    break;
                }
            }
        }

        let tets = dt.tetrahedra();
        let centroids: Vec<Point3<f64>> = tets
            .iter()
            .map(|t| TetElement::new(*t).centroid(&points))
            .collect();
        let inside = plc.contains_all(&centroids);
        let carved: Vec<[usize; 4]> = tets
            .iter()
            .zip(inside)
            .filter_map(|(t, keep)| keep.then_some(*t))
            .collect();
        log::debug!("carved {} of {} delaunay tetrahedra", carved.len(), tets.len());

        if carved.is_empty() {
            return Err(ModalError::TetrahedralizationFailed(
                "no tetrahedra inside the surface".to_string(),
            ));
        }
        VolumetricMesh::from_tetrahedra(points, carved)
    }

    /// Interior grid points at roughly the surface edge spacing, kept
    /// away from surface vertices
    fn steiner_grid(&self, plc: &Plc) -> Vec<Point3<f64>> {
        let bounds = plc.bounds();
        let extent = bounds.extent();
        let mut h = plc.mean_edge_length().min(bounds.diagonal() / 8.0);
        let box_volume = extent.x.max(h) * extent.y.max(h) * extent.z.max(h);
        let cap = self.max_steiner_points.max(1) as f64;
        if box_volume / h.powi(3) > cap {
            h = (box_volume / cap).cbrt();
        }
        if h <= 0.0 || !h.is_finite() {
            return Vec::new();
        }

        let cell = |p: &Point3<f64>| {
            (
                (p.x / h).floor() as i64,
                (p.y / h).floor() as i64,
                (p.z / h).floor() as i64,
            )
        };
        let mut buckets: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        for (i, p) in plc.points.iter().enumerate() {
            buckets.entry(cell(p)).or_default().push(i);
        }
        let clearance = 0.5 * h;
        let near_surface_vertex = |p: &Point3<f64>| {
            let (cx, cy, cz) = cell(p);
            (-1..=1).any(|dx| {
                (-1..=1).any(|dy| {
                    (-1..=1).any(|dz| {
                        buckets.get(&(cx + dx, cy + dy, cz + dz)).map_or(false, |ids| {
                            ids.iter().any(|&i| (plc.points[i] - p).norm() < clearance)
                        })
                    })
                })
            })
        };

        let counts = extent.map(|e| (e / h).floor() as usize);
        let mut candidates = Vec::new();
        for i in 0..counts.x {
            for j in 0..counts.y {
                for k in 0..counts.z {
                    let p = bounds.min
                        + Vector3::new(
                            (i as f64 + 0.5) * h + 0.5 * (extent.x - counts.x as f64 * h),
                            (j as f64 + 0.5) * h + 0.5 * (extent.y - counts.y as f64 * h),
                            (k as f64 + 0.5) * h + 0.5 * (extent.z - counts.z as f64 * h),
                        );
                    if !near_surface_vertex(&p) {
                        candidates.push(p);
                    }
                }
            }
        }

        let inside = plc.contains_all(&candidates);
        candidates
            .into_iter()
            .zip(inside)
            .filter_map(|(p, keep)| keep.then_some(p))
            .collect()
    }

    /// Circumcentres of badly shaped interior elements
    fn refinement_candidates(&self, dt: &Delaunay3, plc: &Plc, limit: usize) -> Vec<Point3<f64>> {
        let bounds = plc.bounds();
        let mut seen: HashSet<(i64, i64, i64)> = HashSet::new();
        let snap = 1e-6 * bounds.diagonal().max(f64::MIN_POSITIVE);

        let mut candidates: Vec<Point3<f64>> = Vec::new();
        for t in dt.tetrahedra() {
            let corners = t.map(|i| dt.point(i));
            if radius_edge_ratio(&corners) <= self.max_radius_edge {
                continue;
            }
            let Some((center, _)) = circumsphere(&corners) else {
                continue;
            };
            if !bounds.contains(&center) {
                continue;
            }
            let key = (
                (center.x / snap).round() as i64,
                (center.y / snap).round() as i64,
                (center.z / snap).round() as i64,
            );
            if seen.insert(key) {
                candidates.push(center);
            }
        }

        let inside = plc.contains_all(&candidates);
        candidates
            .into_iter()
            .zip(inside)
            .filter_map(|(p, keep)| keep.then_some(p))
            .take(limit)
            .collect()
    }
}

/// Tetrahedralize a closed polyhedral surface with default settings
pub fn tetrahedralize(mesh: &PolyhedralMesh, quality: TetQuality) -> Result<VolumetricMesh> {
    let plc = Plc::from_mesh(mesh)?;
    VolumeGenerator::new().generate(&plc, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_switches() {
        assert_eq!(TetQuality::Plain.switches(), "p");
        assert_eq!(TetQuality::Quality.switches(), "pq");
        assert_eq!(TetQuality::default(), TetQuality::Plain);
    }

    #[test]
    fn test_cube_plain() {
        let mesh = tetrahedralize(&PolyhedralMesh::cube(2.0), TetQuality::Plain).unwrap();
        assert!(mesh.num_tetrahedra() >= 5);
        assert_eq!(mesh.num_vertices(), 8);
        assert_relative_eq!(mesh.total_volume(), 8.0, epsilon = 1e-4);
        assert!(mesh.quality().is_acceptable());
    }

    #[test]
    fn test_cube_quality_adds_interior_points() {
        let plain = tetrahedralize(&PolyhedralMesh::cube(1.0), TetQuality::Plain).unwrap();
        let quality = tetrahedralize(&PolyhedralMesh::cube(1.0), TetQuality::Quality).unwrap();
        assert!(quality.num_vertices() > plain.num_vertices());
        assert!(quality.num_tetrahedra() > plain.num_tetrahedra());
        assert_relative_eq!(quality.total_volume(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_same_seed_same_mesh() {
        let cube = PolyhedralMesh::cube(1.0);
        let a = tetrahedralize(&cube, TetQuality::Quality).unwrap();
        let b = tetrahedralize(&cube, TetQuality::Quality).unwrap();
        assert_eq!(a.points, b.points);
        assert_eq!(a.tets, b.tets);
    }

    #[test]
    fn test_open_surface_fails() {
        let cube = PolyhedralMesh::cube(1.0);
        let mut tris = cube.triangles();
        tris.truncate(10);
        let open = PolyhedralMesh::from_triangles(cube.vertices().to_vec(), &tris).unwrap();
        let err = tetrahedralize(&open, TetQuality::Plain).unwrap_err();
        assert!(matches!(err, ModalError::TetrahedralizationFailed(_)));
    }
}
