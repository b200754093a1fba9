/// Dense vs subspace eigen-solver on the free-free steel cube

use modal_mesh::{Assembler, EigenSolverKind, GeneralizedEigenSolver, MaterialPreset, VolumetricMesh};
use std::f64::consts::PI;

#[allow(non_snake_case)]
fn main() {
    env_logger::init();
    println!("=== Eigen-Solver Comparison ===\n");

    let steel = MaterialPreset::Steel.properties();
    let elasticity = match steel.elasticity() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("bad material: {}", e);
            return;
        }
    };

    for n in [2, 3, 4] {
        let mesh = match VolumetricMesh::structured_box(n, n, n, 1.0, 1.0, 1.0) {
            Ok(mesh) => mesh,
            Err(e) => {
                eprintln!("mesh generation failed: {}", e);
                return;
            }
        };
        let (K, M) = Assembler::assemble_modal_system(&mesh, &elasticity, steel.density);
        println!("--- {}x{}x{} cells: {} DOFs, K nnz = {} ---", n, n, n, K.rows(), K.nnz());

        let count = 16;
        let dense = GeneralizedEigenSolver::new(EigenSolverKind::Dense).solve(&K, &M, count);
        let subspace = GeneralizedEigenSolver::new(EigenSolverKind::Subspace).solve(&K, &M, count);
        let (dense, subspace) = match (dense, subspace) {
            (Ok(d), Ok(s)) => (d, s),
            (Err(e), _) | (_, Err(e)) => {
                eprintln!("solve failed: {}", e);
                continue;
            }
        };

        println!("  dense:    {:.3}s", dense.solve_time);
        println!(
            "  subspace: {:.3}s, {} iterations, {}/{} converged",
            subspace.solve_time,
            subspace.iterations,
            subspace.converged,
            subspace.values.len()
        );
        println!("\n  {:>4}  {:>14}  {:>14}  {:>10}", "mode", "dense (Hz)", "subspace (Hz)", "rel diff");
        for (i, (a, b)) in dense.values.iter().zip(&subspace.values).enumerate().skip(6) {
            let fa = a.max(0.0).sqrt() / (2.0 * PI);
            let fb = b.max(0.0).sqrt() / (2.0 * PI);
            println!("  {:>4}  {:>14.3}  {:>14.3}  {:>10.2e}", i, fa, fb, (fa - fb).abs() / fa);
        }
        println!();
    }
}
