/// Incremental Delaunay tetrahedralization (Bowyer–Watson)
///
/// Points are inserted one at a time: every element whose circumsphere
/// contains the new point is removed and the resulting star-shaped cavity
/// is re-filled with elements joining its boundary faces to the point.
/// A large enclosing tetrahedron seeds the triangulation; its four
/// vertices occupy indices 0..4 and are stripped on output.

use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

use crate::geometry::Aabb;
use crate::mesh::quality::{circumsphere, compute_tet_jacobian};
use crate::mesh::TetElement;

const SUPER_VERTICES: usize = 4;

#[derive(Debug, Clone)]
struct DelaunayTet {
    nodes: [usize; 4],
    center: Point3<f64>,
    radius2: f64,
    alive: bool,
}

#[derive(Debug, Clone)]
pub struct Delaunay3 {
    points: Vec<Point3<f64>>,
    tets: Vec<DelaunayTet>,
    num_alive: usize,
    /// Points closer than this to an existing vertex are duplicates
    merge_distance: f64,
}

impl Delaunay3 {
    /// Start an empty triangulation able to hold points inside `bounds`
    pub fn new(bounds: &Aabb) -> Self {
        let c = bounds.center();
        let diagonal = bounds.diagonal().max(1e-12);
        let s = 50.0 * diagonal;
        let points = vec![
            c + Vector3::new(s, s, s),
            c + Vector3::new(s, -s, -s),
            c + Vector3::new(-s, s, -s),
            c + Vector3::new(-s, -s, s),
        ];
        let mut tri = Self {
            points,
            tets: Vec::new(),
            num_alive: 0,
            merge_distance: 1e-6 * diagonal,
        };
        tri.push_tet([0, 1, 2, 3]);
        tri
    }

    /// Insert a point, returning its index among the user points
    ///
    /// Returns `None` when no circumsphere contains the point (duplicate or
    /// outside the seed tetrahedron).
    pub fn insert(&mut self, p: Point3<f64>) -> Option<usize> {
        let bad: Vec<usize> = self
            .tets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.alive && (p - t.center).norm_squared() < t.radius2 * (1.0 - 1e-12))
            .map(|(i, _)| i)
            .collect();
        if bad.is_empty() {
            return None;
        }
        // A duplicate always sits on the circumsphere of the elements around it
        let merge2 = self.merge_distance * self.merge_distance;
        let duplicate = bad.iter().any(|&ti| {
            self.tets[ti]
                .nodes
                .iter()
                .any(|&n| (self.points[n] - p).norm_squared() <= merge2)
        });
        if duplicate {
            return None;
        }

        // Cavity boundary: faces owned by exactly one removed element
        let mut faces: HashMap<[usize; 3], ([usize; 3], u8)> = HashMap::new();
        for &ti in &bad {
            let elem = TetElement::new(self.tets[ti].nodes);
            for face in elem.faces() {
                let mut key = face;
                key.sort_unstable();
                faces.entry(key).or_insert((face, 0)).1 += 1;
            }
        }
        for &ti in &bad {
            self.tets[ti].alive = false;
        }
        self.num_alive -= bad.len();

        let pi = self.points.len();
        self.points.push(p);

        let mut boundary: Vec<[usize; 3]> = faces
            .into_values()
            .filter(|(_, count)| *count == 1)
            .map(|(face, _)| face)
            .collect();
        boundary.sort_unstable();
        for face in boundary {
            self.push_tet([face[0], face[1], face[2], pi]);
        }

        if self.tets.len() > 2 * self.num_alive + 64 {
            self.tets.retain(|t| t.alive);
        }
        Some(pi - SUPER_VERTICES)
    }

    pub fn num_points(&self) -> usize {
        self.points.len() - SUPER_VERTICES
    }

    pub fn point(&self, index: usize) -> Point3<f64> {
        self.points[index + SUPER_VERTICES]
    }

    /// Elements not touching the seed tetrahedron, in user point indices
    pub fn tetrahedra(&self) -> Vec<[usize; 4]> {
        self.tets
            .iter()
            .filter(|t| t.alive && t.nodes.iter().all(|&n| n >= SUPER_VERTICES))
            .map(|t| t.nodes.map(|n| n - SUPER_VERTICES))
            .collect()
    }

    fn push_tet(&mut self, mut nodes: [usize; 4]) {
        if compute_tet_jacobian(&nodes.map(|i| self.points[i])) < 0.0 {
            nodes.swap(2, 3);
        }
        let corners = nodes.map(|i| self.points[i]);
        let (center, radius2) = match circumsphere(&corners) {
            Some((c, r)) => (c, r * r),
            // Flat element: never reported as containing a point
            None => (corners[0], 0.0),
        };
        self.tets.push(DelaunayTet {
            nodes,
            center,
            radius2,
            alive: true,
        });
        self.num_alive += 1;
    }
}
