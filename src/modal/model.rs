/// One resonant mode of the synthesized object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mode {
    pub frequency_hz: f64,
    /// Time for a 60 dB decay (s)
    pub t60: f64,
    /// Exponential decay rate ζω (1/s)
    pub decay_rate: f64,
    pub damping_ratio: f64,
}

/// Modal synthesis model
///
/// Modes are sorted by frequency. `gains[c][m]` is the gain of mode `m`
/// when the object is struck at excitation channel `c`; the largest gain
/// in the table is 1.
#[derive(Debug, Clone, Default)]
pub struct ModalModel {
    pub modes: Vec<Mode>,
    pub gains: Vec<Vec<f64>>,
    /// Volumetric-mesh vertex index of each excitation channel
    pub channels: Vec<usize>,
    /// Number of synthesis modes that was asked for
    pub requested_modes: usize,
    /// Non-fatal degradations noticed while building
    pub warnings: Vec<String>,
}

impl ModalModel {
    pub fn num_modes(&self) -> usize {
        self.modes.len()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Fewer modes survived than were requested
    pub fn is_degraded(&self) -> bool {
        self.modes.len() < self.requested_modes
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.modes.iter().map(|m| m.frequency_hz).collect()
    }

    pub fn t60s(&self) -> Vec<f64> {
        self.modes.iter().map(|m| m.t60).collect()
    }

    pub fn gain(&self, channel: usize, mode: usize) -> Option<f64> {
        self.gains.get(channel)?.get(mode).copied()
    }
}
