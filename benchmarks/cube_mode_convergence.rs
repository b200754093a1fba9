/// Lowest elastic frequency of a steel cube under mesh refinement
///
/// Linear tetrahedra are too stiff, so the frequency should fall as the
/// mesh is refined.

use modal_mesh::{MaterialPreset, ModalModelBuilder, ModalParams, VolumetricMesh};

fn main() {
    env_logger::init();
    println!("=== Cube Mode Convergence ===\n");

    let steel = MaterialPreset::Steel.properties();
    let params = ModalParams::default().with_band(0.0, 1.0e6).with_modes(6, 12);

    println!("{:>6}  {:>8}  {:>8}  {:>12}  {:>12}", "cells", "nodes", "tets", "f1 (Hz)", "f6 (Hz)");
    let mut previous: Option<f64> = None;
    for n in 1..=5 {
        let mesh = match VolumetricMesh::structured_box(n, n, n, 1.0, 1.0, 1.0) {
            Ok(mesh) => mesh,
            Err(e) => {
                eprintln!("mesh generation failed: {}", e);
                return;
            }
        };
        let channels: Vec<usize> = (0..mesh.num_vertices()).step_by(7).collect();
        let model = match ModalModelBuilder::new(steel, params.clone()).build(&mesh, &channels) {
            Ok(model) => model,
            Err(e) => {
                eprintln!("n = {}: {}", n, e);
                continue;
            }
        };
        let freqs = model.frequencies();
        let f1 = freqs.first().copied().unwrap_or(f64::NAN);
        let f6 = freqs.last().copied().unwrap_or(f64::NAN);
        println!(
            "{:>6}  {:>8}  {:>8}  {:>12.2}  {:>12.2}",
            format!("{}^3", n),
            mesh.num_vertices(),
            mesh.num_tetrahedra(),
            f1,
            f6
        );
        if let Some(prev) = previous {
            if f1 > prev {
                println!("  warning: f1 increased under refinement");
            }
        }
        previous = Some(f1);
    }
}
