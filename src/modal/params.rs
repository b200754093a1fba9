use serde::{Deserialize, Serialize};

use crate::error::{ModalError, Result};
use crate::linalg::EigenSolverKind;

/// Which surviving modes are kept for synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelection {
    /// Lowest frequencies in the band
    #[default]
    Lowest,
    /// Largest mean gain over the excitation channels
    Loudest,
}

/// Modal analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalParams {
    /// Lower edge of the kept band (Hz)
    pub low_hz: f64,
    /// Upper edge of the kept band (Hz)
    pub high_hz: f64,
    /// Modes handed to the synthesis program
    pub synth_modes: usize,
    /// Elastic modes computed by the eigen-solve
    pub fem_modes: usize,
    pub selection: ModeSelection,
    /// Multiplier on every T60
    pub t60_scale: f64,
    pub solver: EigenSolverKind,
}

impl Default for ModalParams {
    fn default() -> Self {
        Self {
            low_hz: 20.0,
            high_hz: 10_000.0,
            synth_modes: 20,
            fem_modes: 60,
            selection: ModeSelection::Lowest,
            t60_scale: 1.0,
            solver: EigenSolverKind::Auto,
        }
    }
}

/// Free-free bodies have six zero-frequency modes
pub const RIGID_BODY_MODES: usize = 6;

impl ModalParams {
    pub fn with_band(mut self, low_hz: f64, high_hz: f64) -> Self {
        self.low_hz = low_hz;
        self.high_hz = high_hz;
        self
    }

    pub fn with_modes(mut self, synth_modes: usize, fem_modes: usize) -> Self {
        self.synth_modes = synth_modes;
        self.fem_modes = fem_modes;
        self
    }

    pub fn with_selection(mut self, selection: ModeSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_solver(mut self, solver: EigenSolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Eigenpairs requested from the solver
    pub fn eigenpairs_requested(&self) -> usize {
        self.fem_modes + RIGID_BODY_MODES
    }

    pub fn validate(&self) -> Result<()> {
        if self.synth_modes == 0 {
            return Err(ModalError::InvalidParameters(
                "synth_modes must be at least 1".to_string(),
            ));
        }
        if self.fem_modes < self.synth_modes {
            return Err(ModalError::InvalidParameters(format!(
                "fem_modes ({}) must be >= synth_modes ({})",
                self.fem_modes, self.synth_modes
            )));
        }
        if !(self.low_hz >= 0.0 && self.low_hz < self.high_hz && self.high_hz.is_finite()) {
            return Err(ModalError::InvalidParameters(format!(
                "frequency band [{}, {}] Hz is empty or invalid",
                self.low_hz, self.high_hz
            )));
        }
        if !(self.t60_scale > 0.0 && self.t60_scale.is_finite()) {
            return Err(ModalError::InvalidParameters(format!(
                "t60_scale must be positive, got {}",
                self.t60_scale
            )));
        }
        Ok(())
    }
}
