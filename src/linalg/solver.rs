use sprs::CsMat;

/// Statistics from solver execution
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// Number of iterations
    pub iterations: usize,

    /// Final residual norm ||r|| = ||b - Ax||
    pub residual_norm: f64,

    /// Relative residual ||r|| / ||b||
    pub relative_residual: f64,

    /// Whether solver converged
    pub converged: bool,

    /// Solve time in seconds
    pub solve_time: f64,
}

impl SolverStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Trait for a linear operator A that can be applied to a vector x to get Ax
pub trait LinearOperator {
    /// Apply the operator to vector v: out = A * v
    fn apply(&self, v: &[f64]) -> Vec<f64>;

    /// Number of rows (output dimension)
    fn rows(&self) -> usize;

    /// Number of columns (input dimension)
    fn cols(&self) -> usize;
}

impl LinearOperator for CsMat<f64> {
    fn apply(&self, v: &[f64]) -> Vec<f64> {
        let mut result = vec![0.0; self.rows()];
        for (row_idx, row) in self.outer_iterator().enumerate() {
            result[row_idx] = row.iter().map(|(col_idx, &val)| val * v[col_idx]).sum();
        }
        result
    }

    fn rows(&self) -> usize {
        self.rows()
    }

    fn cols(&self) -> usize {
        self.cols()
    }
}

/// The pencil K + σM applied without forming the sum
#[allow(non_snake_case)]
pub struct ShiftedOperator<'a> {
    pub K: &'a CsMat<f64>,
    pub M: &'a CsMat<f64>,
    pub sigma: f64,
}

impl LinearOperator for ShiftedOperator<'_> {
    fn apply(&self, v: &[f64]) -> Vec<f64> {
        let mut out = self.K.apply(v);
        if self.sigma != 0.0 {
            for (o, m) in out.iter_mut().zip(self.M.apply(v)) {
                *o += self.sigma * m;
            }
        }
        out
    }

    fn rows(&self) -> usize {
        self.K.rows()
    }

    fn cols(&self) -> usize {
        self.K.cols()
    }
}

/// Linear system solver trait
///
/// Solves Ax = b for x
pub trait Solver {
    /// Solve the linear system Ax = b
    #[allow(non_snake_case)]
    fn solve(&mut self, A: &CsMat<f64>, b: &[f64]) -> (Vec<f64>, SolverStats);

    /// Get solver name
    fn name(&self) -> &str;

    /// Get relative tolerance
    fn tolerance(&self) -> f64;

    /// Set relative tolerance
    fn set_tolerance(&mut self, tolerance: f64);
}

/// Helper functions for solver validation
pub struct SolverUtils;

impl SolverUtils {
    /// Compute residual r = b - Ax
    #[allow(non_snake_case)]
    pub fn compute_residual<O: LinearOperator>(A: &O, x: &[f64], b: &[f64]) -> Vec<f64> {
        let ax = A.apply(x);
        b.iter()
            .zip(ax.iter())
            .map(|(&bi, &axi)| bi - axi)
            .collect()
    }

    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    /// Compute L2 norm of a vector
    pub fn norm(v: &[f64]) -> f64 {
        v.iter().map(|&x| x * x).sum::<f64>().sqrt()
    }

    /// Compute relative residual ||b - Ax|| / ||b||
    #[allow(non_snake_case)]
    pub fn relative_residual<O: LinearOperator>(A: &O, x: &[f64], b: &[f64]) -> f64 {
        let r_norm = Self::norm(&Self::compute_residual(A, x, b));
        let b_norm = Self::norm(b);

        if b_norm < 1e-14 {
            r_norm
        } else {
            r_norm / b_norm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sprs::TriMat;

    fn spd_2x2() -> CsMat<f64> {
        let mut triplets = TriMat::new((2, 2));
        triplets.add_triplet(0, 0, 2.0);
        triplets.add_triplet(0, 1, 1.0);
        triplets.add_triplet(1, 0, 1.0);
        triplets.add_triplet(1, 1, 2.0);
        triplets.to_csr()
    }

    #[test]
    fn test_norm() {
        assert_relative_eq!(SolverUtils::norm(&[3.0, 4.0]), 5.0, epsilon = 1e-14);
        assert_relative_eq!(SolverUtils::dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_residual() {
        // [2 1; 1 2] x = [3; 3] has solution x = [1; 1]
        let A = spd_2x2();
        let r = SolverUtils::relative_residual(&A, &[1.0, 1.0], &[3.0, 3.0]);
        assert_relative_eq!(r, 0.0, epsilon = 1e-14);
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_shifted_operator() {
        let K = spd_2x2();
        let mut eye = TriMat::new((2, 2));
        eye.add_triplet(0, 0, 1.0);
        eye.add_triplet(1, 1, 1.0);
        let M = eye.to_csr();
        let op = ShiftedOperator { K: &K, M: &M, sigma: 3.0 };
        assert_eq!(op.apply(&[1.0, 0.0]), vec![5.0, 1.0]);
        assert_eq!(op.rows(), 2);
    }
}
