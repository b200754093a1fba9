/// Strain-displacement relationship for the linear tetrahedron
///
/// Shape functions of a 4-node tetrahedron are linear, so their gradients
/// and the resulting B-matrix are constant over the element.

use nalgebra::{Matrix3, Point3, SMatrix};

/// Strain-displacement matrix computations
pub struct StrainDisplacement;

impl StrainDisplacement {
    /// Cartesian gradients ∇N_i of the four shape functions
    ///
    /// Returns `None` for a flat element.
    #[allow(non_snake_case)]
    pub fn shape_gradients(vertices: &[Point3<f64>; 4]) -> Option<[[f64; 3]; 4]> {
        // Columns are the edge vectors from vertex 0
        let J = Matrix3::from_columns(&[
            vertices[1] - vertices[0],
            vertices[2] - vertices[0],
            vertices[3] - vertices[0],
        ]);
        let J_inv = J.try_inverse()?;

        // ∇N_k for k = 1..3 are the rows of J⁻¹, ∇N_0 = -Σ ∇N_k
        let mut grads = [[0.0; 3]; 4];
        for k in 0..3 {
            for c in 0..3 {
                grads[k + 1][c] = J_inv[(k, c)];
                grads[0][c] -= J_inv[(k, c)];
            }
        }
        Some(grads)
    }

    /// Compute 6×12 strain-displacement matrix B from shape gradients
    ///
    /// Rows: [ε_xx, ε_yy, ε_zz, γ_xy, γ_yz, γ_zx]; columns: [u_0x, u_0y,
    /// u_0z, ..., u_3z]. For node i, columns 3i..3i+2 are:
    /// ```text
    ///     [∂N_i/∂x    0         0      ]
    ///     [  0      ∂N_i/∂y     0      ]
    ///     [  0        0      ∂N_i/∂z   ]
    ///     [∂N_i/∂y  ∂N_i/∂x     0      ]
    ///     [  0      ∂N_i/∂z  ∂N_i/∂y   ]
    ///     [∂N_i/∂z    0      ∂N_i/∂x   ]
    /// ```
    #[allow(non_snake_case)]
    pub fn compute_b_matrix(dN_dx: &[[f64; 3]; 4]) -> SMatrix<f64, 6, 12> {
        let mut B = SMatrix::<f64, 6, 12>::zeros();

        for (i, grad) in dN_dx.iter().enumerate() {
            let col = 3 * i;
            let [dx, dy, dz] = *grad;

            B[(0, col)] = dx;
            B[(1, col + 1)] = dy;
            B[(2, col + 2)] = dz;

            B[(3, col)] = dy;
            B[(3, col + 1)] = dx;

            B[(4, col + 1)] = dz;
            B[(4, col + 2)] = dy;

            B[(5, col)] = dz;
            B[(5, col + 2)] = dx;
        }

        B
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::SVector;

    fn reference_tet() -> [Point3<f64>; 4] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_reference_gradients() {
        let g = StrainDisplacement::shape_gradients(&reference_tet()).unwrap();
        assert_eq!(g[0], [-1.0, -1.0, -1.0]);
        assert_eq!(g[1], [1.0, 0.0, 0.0]);
        assert_eq!(g[2], [0.0, 1.0, 0.0]);
        assert_eq!(g[3], [0.0, 0.0, 1.0]);
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_b_matrix_rigid_translation() {
        let vertices = [
            Point3::new(0.2, 0.1, 0.0),
            Point3::new(1.3, 0.0, 0.1),
            Point3::new(0.1, 0.9, 0.2),
            Point3::new(0.3, 0.2, 1.1),
        ];
        let g = StrainDisplacement::shape_gradients(&vertices).unwrap();
        let B = StrainDisplacement::compute_b_matrix(&g);

        let mut u = SVector::<f64, 12>::zeros();
        for i in 0..4 {
            u[3 * i] = 0.3;
            u[3 * i + 1] = -1.2;
            u[3 * i + 2] = 0.7;
        }
        let strain = B * u;
        for k in 0..6 {
            assert_relative_eq!(strain[k], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_b_matrix_uniform_stretch() {
        let vertices = reference_tet();
        let g = StrainDisplacement::shape_gradients(&vertices).unwrap();
        let B = StrainDisplacement::compute_b_matrix(&g);

        // u_x = 0.01 x gives ε_xx = 0.01 and nothing else
        let mut u = SVector::<f64, 12>::zeros();
        for (i, v) in vertices.iter().enumerate() {
            u[3 * i] = 0.01 * v.x;
        }
        let strain = B * u;
        assert_relative_eq!(strain[0], 0.01, epsilon = 1e-14);
        for k in 1..6 {
            assert_relative_eq!(strain[k], 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_flat_element_has_no_gradients() {
        let flat = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert!(StrainDisplacement::shape_gradients(&flat).is_none());
    }
}
