use nalgebra::Point3;

use crate::mesh::VolumetricMesh;

/// Upper bound on the number of excitation channels
pub const MAX_CHANNELS: usize = 200;
pub const DEFAULT_CHANNELS: usize = 10;

/// Volumetric-mesh vertices that can be struck
///
/// Channels are spread uniformly over vertex *index order*, not over the
/// surface. The position of a channel in the table is the `position`
/// value the synthesis program expects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExcitationChannels {
    indices: Vec<usize>,
    positions: Vec<Point3<f64>>,
}

impl ExcitationChannels {
    /// Number of channels actually used for `requested` on `num_vertices`
    pub fn clamp_count(requested: usize, num_vertices: usize) -> usize {
        requested.clamp(1, MAX_CHANNELS.min(num_vertices).max(1))
    }

    /// `index_i = floor(i * n / k)`; empty for an empty mesh
    pub fn sample(mesh: &VolumetricMesh, requested: usize) -> Self {
        let n = mesh.num_vertices();
        if n == 0 {
            return Self::default();
        }
        let k = Self::clamp_count(requested, n);
        if k != requested {
            log::debug!("excitation channel count {} clamped to {}", requested, k);
        }
        let indices: Vec<usize> = (0..k).map(|i| i * n / k).collect();
        let positions = indices.iter().map(|&i| mesh.points[i]).collect();
        Self { indices, positions }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Channel closest to `point`; the lowest channel wins ties
    pub fn nearest(&self, point: &Point3<f64>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (channel, p) in self.positions.iter().enumerate() {
            let d2 = (p - point).norm_squared();
            if best.map_or(true, |(_, b)| d2 < b) {
                best = Some((channel, d2));
            }
        }
        best.map(|(channel, _)| channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_mesh(n: usize) -> VolumetricMesh {
        // Points along x; only the point list matters for sampling
        let points = (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        VolumetricMesh::from_parts_unchecked(points, Vec::new())
    }

    #[test]
    fn test_uniform_index_sampling() {
        let mesh = line_mesh(100);
        let channels = ExcitationChannels::sample(&mesh, 10);
        assert_eq!(channels.indices(), &[0, 10, 20, 30, 40, 50, 60, 70, 80, 90]);
        assert_eq!(channels.positions()[3], Point3::new(30.0, 0.0, 0.0));
    }

    #[test]
    fn test_count_clamped() {
        let mesh = line_mesh(7);
        assert_eq!(ExcitationChannels::sample(&mesh, 0).len(), 1);
        assert_eq!(ExcitationChannels::sample(&mesh, 50).indices(), &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(ExcitationChannels::clamp_count(500, 10_000), MAX_CHANNELS);
        assert!(ExcitationChannels::sample(&VolumetricMesh::default(), 10).is_empty());
    }

    #[test]
    fn test_nearest_prefers_first_on_tie() {
        let mesh = line_mesh(3);
        let channels = ExcitationChannels::sample(&mesh, 3);
        assert_eq!(channels.nearest(&Point3::new(0.5, 0.0, 0.0)), Some(0));
        assert_eq!(channels.nearest(&Point3::new(1.6, 3.0, 0.0)), Some(2));
        assert_eq!(ExcitationChannels::default().nearest(&Point3::origin()), None);
    }
}
