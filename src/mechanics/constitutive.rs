/// Constitutive model for the vibrating solid
///
/// Linear isotropic elasticity: the 6×6 matrix D relating engineering
/// strain to stress in Voigt notation.

use nalgebra::SMatrix;

/// Isotropic linear elastic material
///
/// Characterized by Young's modulus E and Poisson's ratio ν.
///
/// # References
/// - Zienkiewicz & Taylor, "The Finite Element Method", Vol. 1
#[derive(Debug, Clone, Copy)]
pub struct IsotropicElasticity {
    pub youngs_modulus: f64, // E (Pa)
    pub poisson_ratio: f64,  // ν (dimensionless)
}

impl IsotropicElasticity {
    /// Create a material, rejecting E ≤ 0 and ν outside (-1, 0.5)
    pub fn new(youngs_modulus: f64, poisson_ratio: f64) -> Result<Self, String> {
        if !(youngs_modulus > 0.0 && youngs_modulus.is_finite()) {
            return Err(format!("Young's modulus must be positive, got {}", youngs_modulus));
        }
        if !(poisson_ratio > -1.0 && poisson_ratio < 0.5) {
            return Err(format!(
                "Poisson's ratio must be in (-1, 0.5), got {}",
                poisson_ratio
            ));
        }
        Ok(Self {
            youngs_modulus,
            poisson_ratio,
        })
    }

    /// Compute 6×6 constitutive matrix D for 3D elasticity
    ///
    /// Voigt ordering: [σ_xx, σ_yy, σ_zz, σ_xy, σ_yz, σ_zx]^T, shear
    /// components paired with engineering strains γ.
    ///
    /// ```text
    /// D = (E / ((1+ν)(1-2ν))) ×
    ///     [1-ν    ν    ν    0      0      0   ]
    ///     [ ν   1-ν    ν    0      0      0   ]
    ///     [ ν    ν   1-ν    0      0      0   ]
    ///     [ 0    0    0  (1-2ν)/2  0      0   ]
    ///     [ 0    0    0    0   (1-2ν)/2   0   ]
    ///     [ 0    0    0    0      0   (1-2ν)/2]
    /// ```
    #[allow(non_snake_case)]
    pub fn constitutive_matrix(&self) -> SMatrix<f64, 6, 6> {
        let E = self.youngs_modulus;
        let nu = self.poisson_ratio;
        let factor = E / ((1.0 + nu) * (1.0 - 2.0 * nu));

        let mut D = SMatrix::<f64, 6, 6>::zeros();
        for i in 0..3 {
            for j in 0..3 {
                D[(i, j)] = if i == j { 1.0 - nu } else { nu };
            }
            D[(i + 3, i + 3)] = (1.0 - 2.0 * nu) / 2.0;
        }
        D * factor
    }

    /// Lamé parameters (λ, μ)
    #[allow(non_snake_case)]
    pub fn lame_parameters(&self) -> (f64, f64) {
        let E = self.youngs_modulus;
        let nu = self.poisson_ratio;

        let lambda = (E * nu) / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let mu = E / (2.0 * (1.0 + nu));
        (lambda, mu)
    }

    /// Shear wave speed √(μ/ρ) for a given density
    pub fn shear_wave_speed(&self, density: f64) -> f64 {
        let (_, mu) = self.lame_parameters();
        (mu / density).sqrt()
    }
}
