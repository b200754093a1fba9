//! Configuration for the mesh-to-modal pipeline
//!
//! Reads TOML files with `[material]`, `[modal]`, `[volume]`,
//! `[excitation]` and `[profile]` sections. Every field has a default, so
//! an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ModalError, Result};
use crate::excitation::DEFAULT_CHANNELS;
use crate::mesh::ProfileOptions;
use crate::modal::{MaterialPreset, MaterialProperties, ModalParams, DEFAULT_MATERIAL};
use crate::volume::{TetQuality, VolumeGenerator};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModalConfig {
    pub material: MaterialConfig,
    pub modal: ModalParams,
    pub volume: VolumeConfig,
    pub excitation: ExcitationConfig,
    pub profile: ProfileOptions,
}

/// Material selection
///
/// Starts from `preset` (steel when absent); any explicit constant
/// overrides the preset's value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub preset: Option<MaterialPreset>,
    pub density: Option<f64>,
    pub youngs_modulus: Option<f64>,
    pub poisson_ratio: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
}

impl MaterialConfig {
    pub fn resolve(&self) -> Result<MaterialProperties> {
        let mut material = self.preset.unwrap_or(DEFAULT_MATERIAL).properties();
        if let Some(v) = self.density {
            material.density = v;
        }
        if let Some(v) = self.youngs_modulus {
            material.youngs_modulus = v;
        }
        if let Some(v) = self.poisson_ratio {
            material.poisson_ratio = v;
        }
        if let Some(v) = self.alpha {
            material.alpha = v;
        }
        if let Some(v) = self.beta {
            material.beta = v;
        }
        material.validate()?;
        Ok(material)
    }

    fn is_customized(&self) -> bool {
        self.density.is_some()
            || self.youngs_modulus.is_some()
            || self.poisson_ratio.is_some()
            || self.alpha.is_some()
            || self.beta.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub quality: TetQuality,
    pub seed: u64,
    /// Radius-edge bound for quality refinement
    pub max_radius_edge: f64,
    pub refinement_rounds: usize,
    pub max_steiner_points: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            quality: TetQuality::Plain,
            seed: 0x5eed,
            max_radius_edge: 2.0,
            refinement_rounds: 4,
            max_steiner_points: 4000,
        }
    }
}

impl VolumeConfig {
    pub fn generator(&self) -> VolumeGenerator {
        VolumeGenerator::new()
            .with_seed(self.seed)
            .with_max_radius_edge(self.max_radius_edge)
            .with_refinement_rounds(self.refinement_rounds)
            .with_max_steiner_points(self.max_steiner_points)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExcitationConfig {
    pub channels: usize,
}

impl Default for ExcitationConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
        }
    }
}

impl ModalConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ModalError::io(path, e))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ModalConfig = toml::from_str(contents)
            .map_err(|e| ModalError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.material.resolve()?;
        self.modal
            .validate()
            .map_err(|e| ModalError::Config(e.to_string()))?;
        if self.profile.radial_slices < 3 {
            return Err(ModalError::Config(format!(
                "profile.radial_slices must be at least 3, got {}",
                self.profile.radial_slices
            )));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ModalError::Config(e.to_string()))
    }

    /// Log the effective configuration
    pub fn log_summary(&self) {
        let preset = self.material.preset.unwrap_or(DEFAULT_MATERIAL);
        log::info!("Configuration:");
        match self.material.resolve() {
            Ok(m) => log::info!(
                "  material: {}{} (rho = {:.0} kg/m3, E = {:.3e} Pa, nu = {:.3}, alpha = {}, beta = {:.1e})",
                preset,
                if self.material.is_customized() { " (customized)" } else { "" },
                m.density,
                m.youngs_modulus,
                m.poisson_ratio,
                m.alpha,
                m.beta
            ),
            Err(e) => log::info!("  material: invalid ({})", e),
        }
        log::info!(
            "  modal: band [{}, {}] Hz, {} synth / {} FEM modes, {:?} selection, T60 x{}, {:?} solver",
            self.modal.low_hz,
            self.modal.high_hz,
            self.modal.synth_modes,
            self.modal.fem_modes,
            self.modal.selection,
            self.modal.t60_scale,
            self.modal.solver
        );
        log::info!(
            "  volume: {:?} (\"{}\"), seed {:#x}",
            self.volume.quality,
            self.volume.quality.switches(),
            self.volume.seed
        );
        log::info!("  excitation: {} channels", self.excitation.channels);
        log::info!(
            "  profile: {} radial slices, {} segments per curve",
            self.profile.radial_slices,
            self.profile.curve_segments
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::ModeSelection;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ModalConfig::from_toml_str("").unwrap();
        assert_eq!(config.excitation.channels, DEFAULT_CHANNELS);
        assert_eq!(config.volume.quality, TetQuality::Plain);
        assert_eq!(config.modal.synth_modes, 20);
        assert_eq!(config.material.resolve().unwrap(), MaterialPreset::Steel.properties());
    }

    #[test]
    fn test_sections_parsed() {
        let text = r#"
            [material]
            preset = "glass"
            beta = 1e-7

            [modal]
            low_hz = 50.0
            high_hz = 8000.0
            synth_modes = 12
            fem_modes = 40
            selection = "loudest"

            [volume]
            quality = "quality"

            [excitation]
            channels = 25

            [profile]
            radial_slices = 16
            closed = true
        "#;
        let config = ModalConfig::from_toml_str(text).unwrap();
        let material = config.material.resolve().unwrap();
        assert_eq!(material.density, 2500.0);
        assert_eq!(material.beta, 1e-7);
        assert_eq!(config.modal.selection, ModeSelection::Loudest);
        assert_eq!(config.modal.fem_modes, 40);
        assert_eq!(config.volume.quality, TetQuality::Quality);
        assert_eq!(config.excitation.channels, 25);
        assert_eq!(config.profile.radial_slices, 16);
        assert_eq!(config.profile.closed, Some(true));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ModalConfig::from_toml_str("[modal]\nsynth_modes = 30\nfem_modes = 10\n"),
            Err(ModalError::Config(_))
        ));
        assert!(ModalConfig::from_toml_str("[material]\npreset = \"cheese\"\n").is_err());
        assert!(ModalConfig::from_toml_str("[material]\npoisson_ratio = 0.7\n").is_err());
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut config = ModalConfig::default();
        config.excitation.channels = 7;
        config.material.preset = Some(MaterialPreset::Wood);
        let text = config.to_toml_string().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let loaded = ModalConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.excitation.channels, 7);
        assert_eq!(loaded.material.preset, Some(MaterialPreset::Wood));

        assert!(matches!(
            ModalConfig::from_file("no/such/config.toml"),
            Err(ModalError::Io { .. })
        ));
    }
}
