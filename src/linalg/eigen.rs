/// Generalized symmetric eigenproblem K φ = λ M φ
///
/// K symmetric positive semi-definite (the free-free stiffness, six zero
/// eigenvalues), M symmetric positive definite (consistent mass). Only the
/// lowest eigenpairs are wanted.

use nalgebra::{Cholesky, DMatrix, DVector, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sprs::CsMat;
use std::time::Instant;

use super::iterative::ConjugateGradient;
use super::preconditioner::{diagonal, JacobiPreconditioner};
use super::solver::{LinearOperator, ShiftedOperator, SolverUtils};
use crate::task::CancellationToken;

/// Above this many DOFs `Auto` switches from the dense to the subspace solver
pub const DENSE_DOF_LIMIT: usize = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EigenSolverKind {
    /// Dense below `DENSE_DOF_LIMIT` DOFs, subspace iteration above
    #[default]
    Auto,
    Dense,
    Subspace,
}

/// Lowest eigenpairs in ascending order
#[derive(Debug, Clone)]
pub struct EigenSolution {
    /// Eigenvalues λ = ω²
    pub values: Vec<f64>,
    /// M-normalised eigenvectors (φᵀ M φ = 1)
    pub vectors: Vec<Vec<f64>>,
    /// Leading pairs that met the convergence tolerance
    pub converged: usize,
    pub iterations: usize,
    pub solve_time: f64,
}

/// Generalized eigen-solver for the modal system
#[derive(Debug, Clone)]
pub struct GeneralizedEigenSolver {
    kind: EigenSolverKind,
    max_iterations: usize,
    tolerance: f64,
    cg_tolerance: f64,
    seed: u64,
    cancel: Option<CancellationToken>,
}

impl Default for GeneralizedEigenSolver {
    fn default() -> Self {
        Self::new(EigenSolverKind::Auto)
    }
}

impl GeneralizedEigenSolver {
    pub fn new(kind: EigenSolverKind) -> Self {
        Self {
            kind,
            max_iterations: 80,
            tolerance: 1e-8,
            cg_tolerance: 1e-10,
            seed: 0x5eed,
            cancel: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Relative eigenvalue change between sweeps that counts as converged
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checked between subspace iterations
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Resolve `Auto` for a problem size
    pub fn effective_kind(&self, n_dofs: usize) -> EigenSolverKind {
        match self.kind {
            EigenSolverKind::Auto if n_dofs <= DENSE_DOF_LIMIT => EigenSolverKind::Dense,
            EigenSolverKind::Auto => EigenSolverKind::Subspace,
            kind => kind,
        }
    }

    /// Lowest `count` eigenpairs (fewer when the system is smaller)
    #[allow(non_snake_case)]
    pub fn solve(&self, K: &CsMat<f64>, M: &CsMat<f64>, count: usize) -> Result<EigenSolution, String> {
        let n = K.rows();
        if n == 0 || count == 0 {
            return Ok(EigenSolution {
                values: Vec::new(),
                vectors: Vec::new(),
                converged: 0,
                iterations: 0,
                solve_time: 0.0,
            });
        }
        if K.cols() != n || M.rows() != n || M.cols() != n {
            return Err(format!(
                "matrix shapes differ: K {}x{}, M {}x{}",
                K.rows(),
                K.cols(),
                M.rows(),
                M.cols()
            ));
        }

        match self.effective_kind(n) {
            EigenSolverKind::Subspace if count < n => self.solve_subspace(K, M, count),
            _ => self.solve_dense(K, M, count),
        }
    }

    #[allow(non_snake_case)]
    fn solve_dense(&self, K: &CsMat<f64>, M: &CsMat<f64>, count: usize) -> Result<EigenSolution, String> {
        let start = Instant::now();
        let n = K.rows();
        log::debug!("dense generalized eigen-solve, {} DOFs", n);

        let (values, vectors) = dense_generalized_eigen(&to_dense(K), &to_dense(M))?;
        let take = count.min(n);
        Ok(EigenSolution {
            values: values.iter().take(take).copied().collect(),
            vectors: (0..take).map(|c| vectors.column(c).iter().copied().collect()).collect(),
            converged: take,
            iterations: 1,
            solve_time: start.elapsed().as_secs_f64(),
        })
    }

    /// Shifted subspace iteration with Rayleigh–Ritz projection
    ///
    /// Each sweep solves (K + σM) X̄ = M X column by column with
    /// Jacobi-preconditioned CG, then projects K and M onto span(X̄).
    #[allow(non_snake_case)]
    fn solve_subspace(&self, K: &CsMat<f64>, M: &CsMat<f64>, count: usize) -> Result<EigenSolution, String> {
        let start = Instant::now();
        let n = K.rows();
        let q = (2 * count).min(count + 8).min(n);

        // Largest diagonal ratio bounds the spectrum; the shift keeps
        // K + σM definite despite the rigid-body null space
        let scale = diagonal(K)
            .iter()
            .zip(diagonal(M))
            .filter(|(_, m)| *m > 0.0)
            .map(|(k, m)| k / m)
            .fold(0.0, f64::max);
        if !(scale > 0.0) {
            return Err("stiffness matrix has no positive diagonal".to_string());
        }
        let sigma = 1e-4 * scale;

        let op = ShiftedOperator { K, M, sigma };
        let precond = JacobiPreconditioner::for_shifted(&op);
        let cg = ConjugateGradient::new()
            .with_tolerance(self.cg_tolerance)
            .with_max_iterations((10 * n).max(1000));

        log::debug!(
            "subspace iteration: {} DOFs, {} wanted, subspace {}, shift {:.3e}",
            n,
            count,
            q,
            sigma
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut X: Vec<Vec<f64>> = (0..q)
            .map(|_| (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect();
        let mut previous = vec![f64::INFINITY; q];
        let mut values = DVector::zeros(q);
        let mut converged = 0;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            if self.cancel.as_ref().map_or(false, |t| t.is_cancelled()) {
                return Err("eigen-solve cancelled".to_string());
            }
            iterations += 1;

            let X_bar: Vec<Vec<f64>> = X
                .par_iter()
                .map(|x| {
                    let rhs = M.apply(x);
                    let (solution, stats) = cg.solve_with_operator(&op, &rhs, &precond);
                    if !stats.converged {
                        log::debug!(
                            "inner CG stopped at relative residual {:.2e}",
                            stats.relative_residual
                        );
                    }
                    solution
                })
                .collect();

            let KX: Vec<Vec<f64>> = X_bar.par_iter().map(|x| K.apply(x)).collect();
            let MX: Vec<Vec<f64>> = X_bar.par_iter().map(|x| M.apply(x)).collect();
            let K_r = DMatrix::from_fn(q, q, |i, j| SolverUtils::dot(&X_bar[i], &KX[j]));
            let M_r = DMatrix::from_fn(q, q, |i, j| SolverUtils::dot(&X_bar[i], &MX[j]));

            let (ritz_values, Q) = dense_generalized_eigen(&K_r, &M_r)?;
            X = (0..q)
                .into_par_iter()
                .map(|c| {
                    let mut v = vec![0.0; n];
                    for (r, x_bar) in X_bar.iter().enumerate() {
                        let w = Q[(r, c)];
                        for (vi, xi) in v.iter_mut().zip(x_bar) {
                            *vi += w * xi;
                        }
                    }
                    v
                })
                .collect();

            converged = (0..count)
                .take_while(|&i| {
                    (ritz_values[i] - previous[i]).abs() <= self.tolerance * (ritz_values[i].abs() + sigma)
                })
                .count();
            previous = ritz_values.iter().copied().collect();
            values = ritz_values;

            log::trace!("subspace sweep {}: {}/{} converged", iterations, converged, count);
            if converged == count {
                break;
            }
        }

        if converged < count {
            log::warn!(
                "subspace iteration stopped after {} sweeps with {}/{} eigenpairs converged",
                iterations,
                converged,
                count
            );
        } else {
            log::debug!("subspace iteration converged in {} sweeps", iterations);
        }

        X.truncate(count);
        Ok(EigenSolution {
            values: values.iter().take(count).copied().collect(),
            vectors: X,
            converged,
            iterations,
            solve_time: start.elapsed().as_secs_f64(),
        })
    }
}

/// Dense K φ = λ M φ through the Cholesky factor of M
///
/// Returns ascending eigenvalues and the matching M-normalised
/// eigenvectors as columns.
#[allow(non_snake_case)]
pub fn dense_generalized_eigen(
    K: &DMatrix<f64>,
    M: &DMatrix<f64>,
) -> Result<(DVector<f64>, DMatrix<f64>), String> {
    let n = K.nrows();
    let chol = Cholesky::new(M.clone()).ok_or("mass matrix is not positive definite")?;
    let L = chol.l();

    // A = L⁻¹ K L⁻ᵀ, symmetric with the same spectrum as the pencil
    let Y = L
        .solve_lower_triangular(K)
        .ok_or("singular Cholesky factor")?;
    let A = L
        .solve_lower_triangular(&Y.transpose())
        .ok_or("singular Cholesky factor")?;
    let A = (&A + A.transpose()) * 0.5;

    let eig = SymmetricEigen::new(A);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));

    let values = DVector::from_iterator(n, order.iter().map(|&i| eig.eigenvalues[i]));
    let Z = DMatrix::from_fn(n, n, |r, c| eig.eigenvectors[(r, order[c])]);
    let Phi = L
        .transpose()
        .solve_upper_triangular(&Z)
        .ok_or("singular Cholesky factor")?;
    Ok((values, Phi))
}

#[allow(non_snake_case)]
fn to_dense(A: &CsMat<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(A.rows(), A.cols());
    for (&value, (i, j)) in A.iter() {
        dense[(i, j)] += value;
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sprs::TriMat;

    /// Fixed-free spring chain: K tridiagonal, M diagonal
    #[allow(non_snake_case)]
    fn spring_chain(n: usize, free_free: bool) -> (CsMat<f64>, CsMat<f64>) {
        let mut k = TriMat::new((n, n));
        let mut m = TriMat::new((n, n));
        for i in 0..n {
            let diag = if free_free && (i == 0 || i == n - 1) { 1.0 } else { 2.0 };
            k.add_triplet(i, i, diag);
            if i + 1 < n {
                k.add_triplet(i, i + 1, -1.0);
                k.add_triplet(i + 1, i, -1.0);
            }
            m.add_triplet(i, i, 1.0 + 0.1 * i as f64);
        }
        (k.to_csr(), m.to_csr())
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_dense_matches_pencil() {
        let (K, M) = spring_chain(6, false);
        let solution = GeneralizedEigenSolver::new(EigenSolverKind::Dense)
            .solve(&K, &M, 3)
            .unwrap();
        assert_eq!(solution.values.len(), 3);
        assert!(solution.values.windows(2).all(|w| w[0] <= w[1]));

        for (lambda, phi) in solution.values.iter().zip(&solution.vectors) {
            let k_phi = K.apply(phi);
            let m_phi = M.apply(phi);
            for (a, b) in k_phi.iter().zip(&m_phi) {
                assert_relative_eq!(*a, lambda * b, epsilon = 1e-10);
            }
            assert_relative_eq!(SolverUtils::dot(phi, &m_phi), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_subspace_agrees_with_dense() {
        let (K, M) = spring_chain(60, true);
        let dense = GeneralizedEigenSolver::new(EigenSolverKind::Dense)
            .solve(&K, &M, 4)
            .unwrap();
        let subspace = GeneralizedEigenSolver::new(EigenSolverKind::Subspace)
            .with_max_iterations(500)
            .solve(&K, &M, 4)
            .unwrap();

        assert_eq!(subspace.converged, 4);
        // Free-free chain has one zero eigenvalue
        assert!(dense.values[0].abs() < 1e-10);
        assert!(subspace.values[0].abs() < 1e-6);
        for i in 1..4 {
            assert_relative_eq!(subspace.values[i], dense.values[i], max_relative = 1e-6);
        }
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_cancelled_subspace_returns_error() {
        let (K, M) = spring_chain(30, false);
        let token = CancellationToken::new();
        token.cancel();
        let result = GeneralizedEigenSolver::new(EigenSolverKind::Subspace)
            .with_cancellation(token)
            .solve(&K, &M, 2);
        assert!(result.is_err());
    }

    #[test]
    fn test_auto_switches_on_size() {
        let solver = GeneralizedEigenSolver::default();
        assert_eq!(solver.effective_kind(300), EigenSolverKind::Dense);
        assert_eq!(solver.effective_kind(DENSE_DOF_LIMIT + 1), EigenSolverKind::Subspace);
    }
}
