/// Constrained Delaunay backend built on `tritet::Tetgen`

use nalgebra::Point3;

use super::{Plc, TetQuality};
use crate::error::{ModalError, Result};
use crate::mesh::VolumetricMesh;

/// Minimum dihedral angle (degrees) requested in quality mode
const QUALITY_MIN_ANGLE: f64 = 15.0;

fn failed(stage: &str, e: impl std::fmt::Display) -> ModalError {
    ModalError::TetrahedralizationFailed(format!("tetgen {}: {}", stage, e))
}

pub(super) fn generate(plc: &Plc, quality: TetQuality) -> Result<VolumetricMesh> {
    let npoint = plc.points.len();
    let facet_npoint = vec![3; plc.facets.len()];

    let mut tetgen = tritet::Tetgen::new(npoint, Some(facet_npoint), None, None)
        .map_err(|e| failed("init", e))?;
    for (i, p) in plc.points.iter().enumerate() {
        tetgen
            .set_point(i, 0, p.x, p.y, p.z)
            .map_err(|e| failed("set_point", e))?;
    }
    for (fi, facet) in plc.facets.iter().enumerate() {
        for (m, &pi) in facet.iter().enumerate() {
            tetgen
                .set_facet_point(fi, m, pi)
                .map_err(|e| failed("set_facet_point", e))?;
        }
    }

    let min_angle = match quality {
        TetQuality::Plain => None,
        TetQuality::Quality => Some(QUALITY_MIN_ANGLE),
    };
    tetgen
        .generate_mesh(false, false, None, min_angle)
        .map_err(|e| failed("generate_mesh", e))?;

    let out_npoint = tetgen.out_npoint();
    let out_ncell = tetgen.out_ncell();
    log::debug!("tetgen output: {} points, {} cells", out_npoint, out_ncell);
    if tetgen.out_cell_npoint() != 4 {
        return Err(failed(
            "output",
            format!("expected 4 nodes per cell, got {}", tetgen.out_cell_npoint()),
        ));
    }

    let points = (0..out_npoint)
        .map(|i| Point3::new(tetgen.out_point(i, 0), tetgen.out_point(i, 1), tetgen.out_point(i, 2)))
        .collect();
    let tets = (0..out_ncell)
        .map(|c| {
            [
                tetgen.out_cell_point(c, 0),
                tetgen.out_cell_point(c, 1),
                tetgen.out_cell_point(c, 2),
                tetgen.out_cell_point(c, 3),
            ]
        })
        .collect();
    VolumetricMesh::from_tetrahedra(points, tets)
}
