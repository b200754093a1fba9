use sprs::CsMat;
use std::time::Instant;

use super::preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
use super::solver::{LinearOperator, Solver, SolverStats, SolverUtils};

/// Conjugate Gradient solver for symmetric positive definite systems
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    max_iterations: usize,
    tolerance: f64,
    abs_tolerance: f64,
    use_preconditioner: bool,
    name: String,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl ConjugateGradient {
    pub fn new() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            abs_tolerance: 1e-30,
            use_preconditioner: true,
            name: "ConjugateGradient".to_string(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_abs_tolerance(mut self, abs_tolerance: f64) -> Self {
        self.abs_tolerance = abs_tolerance;
        self
    }

    pub fn with_preconditioner(mut self, use_precond: bool) -> Self {
        self.use_preconditioner = use_precond;
        self
    }

    /// Preconditioned CG on any operator, starting from x = 0
    pub fn solve_with_operator<O, P>(&self, a: &O, b: &[f64], precond: &P) -> (Vec<f64>, SolverStats)
    where
        O: LinearOperator + ?Sized,
        P: Preconditioner + ?Sized,
    {
        let n = b.len();
        let start = Instant::now();
        let b_norm = SolverUtils::norm(b);

        if b_norm < 1e-300 {
            return (
                vec![0.0; n],
                SolverStats {
                    converged: true,
                    solve_time: start.elapsed().as_secs_f64(),
                    ..SolverStats::default()
                },
            );
        }

        let mut x = vec![0.0; n];
        let mut r = b.to_vec();
        let mut z = precond.apply(&r);
        let mut p = z.clone();
        let mut rz = SolverUtils::dot(&r, &z);

        let mut iteration = 0;
        let mut converged = false;
        let mut final_res = b_norm;

        while iteration < self.max_iterations {
            let ap = a.apply(&p);
            let p_ap = SolverUtils::dot(&p, &ap);
            if p_ap.abs() < 1e-300 {
                break;
            }
            let alpha = rz / p_ap;

            for i in 0..n {
                x[i] += alpha * p[i];
                r[i] -= alpha * ap[i];
            }
            iteration += 1;

            final_res = SolverUtils::norm(&r);
            if final_res < self.tolerance * b_norm || final_res < self.abs_tolerance {
                converged = true;
                break;
            }

            z = precond.apply(&r);
            let rz_new = SolverUtils::dot(&r, &z);
            let beta = rz_new / rz;
            rz = rz_new;

            for i in 0..n {
                p[i] = z[i] + beta * p[i];
            }
        }

        (
            x,
            SolverStats {
                iterations: iteration,
                residual_norm: final_res,
                relative_residual: final_res / b_norm,
                converged,
                solve_time: start.elapsed().as_secs_f64(),
            },
        )
    }
}

impl Solver for ConjugateGradient {
    fn solve(&mut self, a: &CsMat<f64>, b: &[f64]) -> (Vec<f64>, SolverStats) {
        if self.use_preconditioner {
            self.solve_with_operator(a, b, &JacobiPreconditioner::new(a))
        } else {
            self.solve_with_operator(a, b, &IdentityPreconditioner)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }
}
