/// Material constants for modal analysis
///
/// Elastic constants drive the stiffness, density the mass, and the
/// Rayleigh coefficients (α mass-proportional, β stiffness-proportional)
/// the per-mode decay.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModalError, Result};
use crate::mechanics::IsotropicElasticity;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Density ρ (kg/m³)
    pub density: f64,
    /// Young's modulus E (Pa)
    pub youngs_modulus: f64,
    /// Poisson's ratio ν
    pub poisson_ratio: f64,
    /// Mass-proportional damping α (1/s)
    #[serde(default)]
    pub alpha: f64,
    /// Stiffness-proportional damping β (s)
    #[serde(default)]
    pub beta: f64,
}

impl MaterialProperties {
    pub fn new(density: f64, youngs_modulus: f64, poisson_ratio: f64) -> Self {
        Self {
            density,
            youngs_modulus,
            poisson_ratio,
            alpha: 0.0,
            beta: 0.0,
        }
    }

    pub fn with_damping(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    /// Reject non-physical constants
    pub fn validate(&self) -> Result<()> {
        if !(self.density > 0.0 && self.density.is_finite()) {
            return Err(ModalError::InvalidParameters(format!(
                "density must be positive, got {}",
                self.density
            )));
        }
        if !(self.alpha >= 0.0 && self.beta >= 0.0) {
            return Err(ModalError::InvalidParameters(format!(
                "damping coefficients must be non-negative, got alpha={} beta={}",
                self.alpha, self.beta
            )));
        }
        self.elasticity().map(|_| ())
    }

    pub fn elasticity(&self) -> Result<IsotropicElasticity> {
        IsotropicElasticity::new(self.youngs_modulus, self.poisson_ratio)
            .map_err(ModalError::InvalidParameters)
    }

    /// Damping ratio ζ = α/(2ω) + βω/2 at angular frequency ω
    pub fn damping_ratio(&self, omega: f64) -> f64 {
        self.alpha / (2.0 * omega) + self.beta * omega / 2.0
    }
}

impl From<MaterialPreset> for MaterialProperties {
    fn from(preset: MaterialPreset) -> Self {
        preset.properties()
    }
}

/// Named materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialPreset {
    Steel,
    Iron,
    Glass,
    Ceramic,
    Wood,
    Plastic,
    Polycarbonate,
}

/// Material used when nothing else is configured
pub const DEFAULT_MATERIAL: MaterialPreset = MaterialPreset::Steel;

impl MaterialPreset {
    pub const ALL: [MaterialPreset; 7] = [
        MaterialPreset::Steel,
        MaterialPreset::Iron,
        MaterialPreset::Glass,
        MaterialPreset::Ceramic,
        MaterialPreset::Wood,
        MaterialPreset::Plastic,
        MaterialPreset::Polycarbonate,
    ];

    pub fn properties(&self) -> MaterialProperties {
        // (density, E, ν, α, β)
        let (density, e, nu, alpha, beta) = match self {
            MaterialPreset::Steel => (7850.0, 2.0e11, 0.29, 2.0, 1.0e-8),
            MaterialPreset::Iron => (7870.0, 2.11e11, 0.29, 3.0, 2.0e-8),
            MaterialPreset::Glass => (2500.0, 6.2e10, 0.22, 1.0, 5.0e-8),
            MaterialPreset::Ceramic => (2400.0, 7.0e10, 0.21, 4.0, 8.0e-8),
            MaterialPreset::Wood => (750.0, 1.1e10, 0.35, 30.0, 4.0e-7),
            MaterialPreset::Plastic => (1070.0, 1.4e9, 0.35, 40.0, 1.0e-6),
            MaterialPreset::Polycarbonate => (1200.0, 2.4e9, 0.37, 35.0, 8.0e-7),
        };
        MaterialProperties::new(density, e, nu).with_damping(alpha, beta)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MaterialPreset::Steel => "steel",
            MaterialPreset::Iron => "iron",
            MaterialPreset::Glass => "glass",
            MaterialPreset::Ceramic => "ceramic",
            MaterialPreset::Wood => "wood",
            MaterialPreset::Plastic => "plastic",
            MaterialPreset::Polycarbonate => "polycarbonate",
        }
    }

    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MaterialPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaterialPreset {
    type Err = ModalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            ModalError::InvalidParameters(format!("unknown material preset '{}'", s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_steel_preset() {
        let steel = MaterialPreset::Steel.properties();
        assert_eq!(steel.density, 7850.0);
        assert_eq!(steel.youngs_modulus, 2.0e11);
        assert_eq!(steel.poisson_ratio, 0.29);
        assert_eq!(DEFAULT_MATERIAL, MaterialPreset::Steel);
    }

    #[test]
    fn test_presets_are_physical() {
        for preset in MaterialPreset::ALL {
            assert!(preset.properties().validate().is_ok(), "{}", preset);
        }
    }

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(MaterialPreset::from_name("GLASS"), Some(MaterialPreset::Glass));
        assert_eq!(MaterialPreset::from_name(" Wood "), Some(MaterialPreset::Wood));
        assert_eq!(MaterialPreset::from_name("unobtainium"), None);
        assert!("PolyCarbonate".parse::<MaterialPreset>().is_ok());
    }

    #[test]
    fn test_invalid_material_rejected() {
        let bad = MaterialProperties::new(-1.0, 1.0e9, 0.3);
        assert!(matches!(bad.validate(), Err(ModalError::InvalidParameters(_))));
        let bad = MaterialProperties::new(1000.0, 1.0e9, 0.5);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_rayleigh_damping_ratio() {
        let m = MaterialProperties::new(1.0, 1.0, 0.0).with_damping(2.0, 0.5);
        // ζ = 2/(2·2) + 0.5·2/2
        assert_relative_eq!(m.damping_ratio(2.0), 1.0);
    }
}
