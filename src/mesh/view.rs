/// Geometry views shared by renderers and pickers
///
/// One mesh entity can be displayed as its surface, its tetrahedral volume
/// or its convex hull. The renderer only needs the common contract
/// (positions, normals, triangle indices, bounds), so the views are a
/// closed sum type rather than a trait object.

use nalgebra::{Point3, Vector3};

use super::{PolyhedralMesh, VolumetricMesh};
use crate::error::Result;
use crate::geometry::{convex_hull, Aabb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Polyhedral,
    Volumetric,
    ConvexHull,
}

#[derive(Debug, Clone)]
pub enum ActiveGeometry {
    Polyhedral(PolyhedralMesh),
    /// Volume mesh plus its boundary surface for display
    Volumetric {
        volume: VolumetricMesh,
        surface: PolyhedralMesh,
    },
    ConvexHull(PolyhedralMesh),
}

impl ActiveGeometry {
    pub fn polyhedral(mesh: PolyhedralMesh) -> Self {
        Self::Polyhedral(mesh)
    }

    pub fn volumetric(volume: VolumetricMesh) -> Self {
        let surface = volume.to_polyhedral();
        Self::Volumetric { volume, surface }
    }

    pub fn convex_hull_of(mesh: &PolyhedralMesh) -> Result<Self> {
        Ok(Self::ConvexHull(convex_hull(mesh.vertices())?))
    }

    pub fn mode(&self) -> ViewMode {
        match self {
            Self::Polyhedral(_) => ViewMode::Polyhedral,
            Self::Volumetric { .. } => ViewMode::Volumetric,
            Self::ConvexHull(_) => ViewMode::ConvexHull,
        }
    }

    fn surface(&self) -> &PolyhedralMesh {
        match self {
            Self::Polyhedral(mesh) | Self::ConvexHull(mesh) => mesh,
            Self::Volumetric { surface, .. } => surface,
        }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        self.surface().vertices()
    }

    pub fn normals(&self) -> &[Vector3<f64>] {
        self.surface().vertex_normals()
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        self.surface().triangle_indices()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.surface().compute_bounds()
    }

    pub fn volume(&self) -> Option<&VolumetricMesh> {
        match self {
            Self::Volumetric { volume, .. } => Some(volume),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_share_contract() {
        let cube = PolyhedralMesh::cube(1.0);

        let poly = ActiveGeometry::polyhedral(cube.clone());
        let hull = ActiveGeometry::convex_hull_of(&cube).unwrap();
        assert_eq!(poly.mode(), ViewMode::Polyhedral);
        assert_eq!(hull.mode(), ViewMode::ConvexHull);
        assert_eq!(poly.vertices().len(), 8);
        assert_eq!(hull.indices().len(), 12);
        assert_eq!(poly.normals().len(), poly.vertices().len());
        assert_eq!(poly.bounds(), hull.bounds());
        assert!(poly.volume().is_none());
    }
}
