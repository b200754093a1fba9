use sprs::CsMat;

use super::solver::ShiftedOperator;

/// Preconditioner trait for iterative solvers
///
/// Solves M z = r approximately (where M ≈ A)
pub trait Preconditioner {
    /// Apply preconditioner: z = M⁻¹ r
    fn apply(&self, r: &[f64]) -> Vec<f64>;
}

/// Jacobi (diagonal) preconditioner
///
/// M = diag(A)
pub struct JacobiPreconditioner {
    /// Inverse of diagonal entries: 1/A_ii
    diag_inv: Vec<f64>,
}

impl JacobiPreconditioner {
    /// Create Jacobi preconditioner from matrix A
    #[allow(non_snake_case)]
    pub fn new(A: &CsMat<f64>) -> Self {
        Self::from_diagonal(&diagonal(A))
    }

    /// Diagonal of K + σM
    pub fn for_shifted(op: &ShiftedOperator<'_>) -> Self {
        let k = diagonal(op.K);
        let m = diagonal(op.M);
        let diag: Vec<f64> = k.iter().zip(&m).map(|(k, m)| k + op.sigma * m).collect();
        Self::from_diagonal(&diag)
    }

    /// Zero (or vanishing) entries are left unscaled
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let diag_inv = diag
            .iter()
            .map(|&d| if d.abs() > 1e-300 { 1.0 / d } else { 1.0 })
            .collect();
        Self { diag_inv }
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64]) -> Vec<f64> {
        r.iter()
            .zip(self.diag_inv.iter())
            .map(|(&ri, &di)| ri * di)
            .collect()
    }
}

/// Identity preconditioner (no preconditioning)
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64]) -> Vec<f64> {
        r.to_vec()
    }
}

/// Main diagonal of a square sparse matrix, zero where absent
#[allow(non_snake_case)]
pub fn diagonal(A: &CsMat<f64>) -> Vec<f64> {
    (0..A.rows())
        .map(|i| A.get(i, i).copied().unwrap_or(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    #[test]
    #[allow(non_snake_case)]
    fn test_jacobi_scales_by_diagonal() {
        let mut triplets = TriMat::new((3, 3));
        triplets.add_triplet(0, 0, 4.0);
        triplets.add_triplet(0, 1, 1.0);
        triplets.add_triplet(1, 1, 2.0);
        let A = triplets.to_csr();

        let precond = JacobiPreconditioner::new(&A);
        // Row 2 has no diagonal entry and is passed through
        assert_eq!(precond.apply(&[4.0, 4.0, 4.0]), vec![1.0, 2.0, 4.0]);
        assert_eq!(diagonal(&A), vec![4.0, 2.0, 0.0]);
    }
}
