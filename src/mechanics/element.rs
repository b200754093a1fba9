/// Element matrices for linear elasticity
///
/// Stiffness and consistent mass of the 4-node tetrahedron with three
/// displacement DOFs per node, ordered [u_0x, u_0y, u_0z, ..., u_3z].

use nalgebra::{Point3, SMatrix};

use super::{IsotropicElasticity, StrainDisplacement};
use crate::mesh::compute_tet_jacobian;

/// Element matrix computations for linear elasticity
pub struct ElasticityElement;

impl ElasticityElement {
    pub fn volume(vertices: &[Point3<f64>; 4]) -> f64 {
        compute_tet_jacobian(vertices).abs() / 6.0
    }

    /// Compute element stiffness matrix
    ///
    /// K_e = V Bᵀ D B
    ///
    /// B is constant over a linear tetrahedron, so the integral reduces to
    /// a product with the element volume. A flat element contributes
    /// nothing.
    ///
    /// # References
    /// - Zienkiewicz & Taylor, "The Finite Element Method", Vol. 1
    #[allow(non_snake_case)]
    pub fn stiffness_matrix(
        vertices: &[Point3<f64>; 4],
        material: &IsotropicElasticity,
    ) -> SMatrix<f64, 12, 12> {
        let Some(grads) = StrainDisplacement::shape_gradients(vertices) else {
            return SMatrix::zeros();
        };
        let B = StrainDisplacement::compute_b_matrix(&grads);
        let D = material.constitutive_matrix();

        let DB = D * B;
        let mut K_elem = B.transpose() * DB * Self::volume(vertices);

        // Symmetrize away round-off so the global matrix is exactly symmetric
        K_elem = (K_elem + K_elem.transpose()) * 0.5;
        K_elem
    }

    /// Compute consistent element mass matrix
    ///
    /// M_e = ρV/20 (1 + δ_ij) ⊗ I₃
    #[allow(non_snake_case)]
    pub fn mass_matrix(vertices: &[Point3<f64>; 4], density: f64) -> SMatrix<f64, 12, 12> {
        let m = density * Self::volume(vertices) / 20.0;
        let mut M_elem = SMatrix::<f64, 12, 12>::zeros();
        for i in 0..4 {
            for j in 0..4 {
                let w = if i == j { 2.0 * m } else { m };
                for c in 0..3 {
                    M_elem[(3 * i + c, 3 * j + c)] = w;
                }
            }
        }
        M_elem
    }
}
