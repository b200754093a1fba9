/// Modal model builder
///
/// Assembles the free-free stiffness and mass of the tetrahedral mesh,
/// solves for the lowest vibration modes and packages the audible ones
/// with their decay and per-channel gains.

use std::f64::consts::PI;

use super::material::MaterialProperties;
use super::model::{ModalModel, Mode};
use super::params::{ModalParams, ModeSelection};
use crate::error::{ModalError, Result};
use crate::fem::{Assembler, DofManager};
use crate::linalg::preconditioner::diagonal;
use crate::linalg::GeneralizedEigenSolver;
use crate::mesh::VolumetricMesh;
use crate::task::CancellationToken;

/// Eigenvalues below this fraction of the spectral scale are rigid-body
const RIGID_TOLERANCE: f64 = 1e-8;

const T60_MIN: f64 = 0.001;
const T60_MAX: f64 = 60.0;

/// Candidate elastic mode before selection
struct Candidate {
    omega: f64,
    /// Displacement magnitude at each channel vertex
    amplitudes: Vec<f64>,
}

pub struct ModalModelBuilder {
    material: MaterialProperties,
    params: ModalParams,
    cancel: Option<CancellationToken>,
}

impl ModalModelBuilder {
    pub fn new(material: MaterialProperties, params: ModalParams) -> Self {
        Self {
            material,
            params,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn material(&self) -> &MaterialProperties {
        &self.material
    }

    pub fn params(&self) -> &ModalParams {
        &self.params
    }

    /// Build the modal model of `mesh` excited at the `channels` vertices
    ///
    /// The mesh is only read. Fewer surviving modes than requested is
    /// reported through `ModalModel::warnings`; none at all is an error.
    #[allow(non_snake_case)]
    pub fn build(&self, mesh: &VolumetricMesh, channels: &[usize]) -> Result<ModalModel> {
        self.params.validate()?;
        self.material.validate()?;

        let bbox_volume = mesh.bounds().map(|b| b.volume()).unwrap_or(0.0);
        let volume = mesh.total_volume();
        if mesh.is_empty() || !(volume > 0.0 && volume > 1e-12 * bbox_volume) {
            return Err(ModalError::EmptyVolume);
        }

        if channels.is_empty() {
            return Err(ModalError::InvalidParameters(
                "at least one excitation channel is required".to_string(),
            ));
        }
        if let Some(&bad) = channels.iter().find(|&&c| c >= mesh.num_vertices()) {
            return Err(ModalError::InvalidParameters(format!(
                "excitation vertex {} out of range ({} vertices)",
                bad,
                mesh.num_vertices()
            )));
        }

        if self.is_cancelled() {
            return Err(ModalError::Cancelled);
        }
        let elasticity = self.material.elasticity()?;
        let (K, M) = Assembler::assemble_modal_system(mesh, &elasticity, self.material.density);

        let requested = self.params.eigenpairs_requested();
        let mut solver = GeneralizedEigenSolver::new(self.params.solver);
        if let Some(token) = &self.cancel {
            solver = solver.with_cancellation(token.clone());
        }
        log::info!(
            "modal analysis: {} DOFs, {} eigenpairs requested ({:?} solver)",
            K.rows(),
            requested,
            solver.effective_kind(K.rows())
        );
        let solution = solver.solve(&K, &M, requested).map_err(|e| {
            if self.is_cancelled() {
                ModalError::Cancelled
            } else {
                ModalError::EigenSolveFailed(e)
            }
        })?;
        log::debug!(
            "eigen-solve: {}/{} converged in {} iterations, {:.3}s",
            solution.converged,
            solution.values.len(),
            solution.iterations,
            solution.solve_time
        );

        let scale = diagonal(&K)
            .iter()
            .zip(diagonal(&M))
            .filter(|(_, m)| *m > 0.0)
            .map(|(k, m)| k / m)
            .fold(0.0, f64::max);
        let rigid_threshold = RIGID_TOLERANCE * scale;

        let dof_mgr = DofManager::elasticity(mesh.num_vertices());
        let mut num_rigid = 0;
        let mut num_elastic = 0;
        let mut candidates: Vec<Candidate> = Vec::new();
        for (lambda, phi) in solution
            .values
            .iter()
            .zip(&solution.vectors)
            .take(solution.converged)
        {
            if *lambda <= rigid_threshold {
                num_rigid += 1;
                continue;
            }
            num_elastic += 1;
            if num_elastic > self.params.fem_modes {
                break;
            }
            let omega = lambda.sqrt();
            let frequency = omega / (2.0 * PI);
            if frequency < self.params.low_hz || frequency > self.params.high_hz {
                continue;
            }
            let amplitudes = channels
                .iter()
                .map(|&v| dof_mgr.node_vector(phi, v).norm())
                .collect();
            candidates.push(Candidate { omega, amplitudes });
        }
        if num_rigid != 6 {
            log::debug!("found {} rigid-body modes (expected 6)", num_rigid);
        }

        let selected = self.select(candidates);
        if selected.is_empty() {
            return Err(ModalError::InsufficientModes {
                requested: self.params.synth_modes,
                available: 0,
            });
        }

        let mut model = self.package(selected, channels);
        if model.is_degraded() {
            let message = format!(
                "only {} of {} requested modes lie in [{}, {}] Hz",
                model.num_modes(),
                self.params.synth_modes,
                self.params.low_hz,
                self.params.high_hz
            );
            log::warn!("{}", message);
            model.warnings.push(message);
        }
        if solution.converged < solution.values.len() {
            let message = format!(
                "eigen-solver converged {} of {} eigenpairs",
                solution.converged,
                solution.values.len()
            );
            log::warn!("{}", message);
            model.warnings.push(message);
        }

        log::info!(
            "modal model: {} modes, {:.1}-{:.1} Hz, {} channels",
            model.num_modes(),
            model.modes.first().map_or(0.0, |m| m.frequency_hz),
            model.modes.last().map_or(0.0, |m| m.frequency_hz),
            model.num_channels()
        );
        Ok(model)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |t| t.is_cancelled())
    }

    /// Candidates arrive in ascending frequency
    fn select(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        let keep = self.params.synth_modes;
        match self.params.selection {
            ModeSelection::Lowest => {
                candidates.truncate(keep);
                candidates
            }
            ModeSelection::Loudest => {
                let loudness = |c: &Candidate| {
                    c.amplitudes.iter().sum::<f64>() / c.amplitudes.len().max(1) as f64
                };
                // Stable sort keeps the lower mode first on ties
                candidates.sort_by(|a, b| loudness(b).total_cmp(&loudness(a)));
                candidates.truncate(keep);
                candidates.sort_by(|a, b| a.omega.total_cmp(&b.omega));
                candidates
            }
        }
    }

    fn package(&self, selected: Vec<Candidate>, channels: &[usize]) -> ModalModel {
        let modes = selected
            .iter()
            .map(|c| {
                let damping_ratio = self.material.damping_ratio(c.omega);
                let decay_rate = damping_ratio * c.omega;
                let t60 = if decay_rate > 0.0 {
                    1000.0_f64.ln() / decay_rate
                } else {
                    T60_MAX
                };
                Mode {
                    frequency_hz: c.omega / (2.0 * PI),
                    t60: t60.clamp(T60_MIN, T60_MAX) * self.params.t60_scale,
                    decay_rate,
                    damping_ratio,
                }
            })
            .collect();

        let peak = selected
            .iter()
            .flat_map(|c| c.amplitudes.iter().copied())
            .fold(0.0, f64::max);
        let norm = if peak > 0.0 { 1.0 / peak } else { 0.0 };
        let gains = (0..channels.len())
            .map(|ch| selected.iter().map(|c| c.amplitudes[ch] * norm).collect())
            .collect();

        ModalModel {
            modes,
            gains,
            channels: channels.to_vec(),
            requested_modes: self.params.synth_modes,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::MaterialPreset;
    use approx::assert_relative_eq;

    fn structured_cube(n: usize) -> VolumetricMesh {
        VolumetricMesh::structured_box(n, n, n, 1.0, 1.0, 1.0).unwrap()
    }

    fn steel() -> MaterialProperties {
        MaterialPreset::Steel.properties()
    }

    #[test]
    fn test_lowest_mode_positive_and_finite() {
        let mesh = structured_cube(2);
        let params = ModalParams::default().with_band(0.0, 1.0e6).with_modes(5, 10);
        let model = ModalModelBuilder::new(steel(), params)
            .build(&mesh, &[0, 13, 26])
            .unwrap();
        assert_eq!(model.num_modes(), 5);
        let f0 = model.modes[0].frequency_hz;
        assert!(f0.is_finite() && f0 > 0.0);
        assert!(model.frequencies().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_gain_table_shape_and_normalisation() {
        let mesh = structured_cube(2);
        let channels = [0, 4, 13, 22, 26];
        let params = ModalParams::default().with_band(0.0, 1.0e6).with_modes(8, 12);
        let model = ModalModelBuilder::new(steel(), params).build(&mesh, &channels).unwrap();

        assert_eq!(model.gains.len(), channels.len());
        assert!(model.gains.iter().all(|g| g.len() == model.num_modes()));
        let peak = model.gains.iter().flatten().copied().fold(0.0, f64::max);
        assert_relative_eq!(peak, 1.0, epsilon = 1e-12);
        assert_eq!(model.channels, channels.to_vec());
    }

    #[test]
    fn test_t60_follows_rayleigh_damping() {
        let mesh = structured_cube(1);
        let material = steel();
        let params = ModalParams::default().with_band(0.0, 1.0e7).with_modes(3, 3);
        let model = ModalModelBuilder::new(material, params).build(&mesh, &[0]).unwrap();
        for mode in &model.modes {
            let omega = 2.0 * PI * mode.frequency_hz;
            let zeta = material.alpha / (2.0 * omega) + material.beta * omega / 2.0;
            let expected = (1000.0_f64.ln() / (zeta * omega)).clamp(T60_MIN, T60_MAX);
            assert_relative_eq!(mode.t60, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_loudest_selection_sorted_by_frequency() {
        let mesh = structured_cube(2);
        let params = ModalParams::default()
            .with_band(0.0, 1.0e6)
            .with_modes(4, 12)
            .with_selection(ModeSelection::Loudest);
        let model = ModalModelBuilder::new(steel(), params).build(&mesh, &[0, 26]).unwrap();
        assert_eq!(model.num_modes(), 4);
        assert!(model.frequencies().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_narrow_band_is_degraded_not_fatal() {
        let mesh = structured_cube(2);
        let full = ModalModelBuilder::new(steel(), ModalParams::default().with_band(0.0, 1.0e6).with_modes(3, 10))
            .build(&mesh, &[0])
            .unwrap();
        // A band just wide enough for the lowest elastic mode
        let f0 = full.modes[0].frequency_hz;
        let params = ModalParams::default().with_band(0.5 * f0, f0 * 1.000001).with_modes(5, 10);
        let model = ModalModelBuilder::new(steel(), params).build(&mesh, &[0]).unwrap();
        assert!(model.num_modes() >= 1 && model.num_modes() < 5);
        assert!(model.is_degraded());
        assert!(!model.warnings.is_empty());
    }

    #[test]
    fn test_band_without_modes_fails() {
        let mesh = structured_cube(1);
        let params = ModalParams::default().with_band(1.0, 2.0).with_modes(3, 6);
        let err = ModalModelBuilder::new(steel(), params).build(&mesh, &[0]).unwrap_err();
        assert!(matches!(err, ModalError::InsufficientModes { available: 0, .. }));
    }

    #[test]
    fn test_empty_mesh_and_bad_channels() {
        let builder = ModalModelBuilder::new(steel(), ModalParams::default());
        assert!(matches!(
            builder.build(&VolumetricMesh::default(), &[0]),
            Err(ModalError::EmptyVolume)
        ));
        let mesh = structured_cube(1);
        assert!(matches!(builder.build(&mesh, &[]), Err(ModalError::InvalidParameters(_))));
        assert!(matches!(builder.build(&mesh, &[99]), Err(ModalError::InvalidParameters(_))));
    }

    #[test]
    fn test_cancelled_before_solve() {
        let mesh = structured_cube(2);
        let token = CancellationToken::new();
        token.cancel();
        let params = ModalParams::default()
            .with_modes(3, 6)
            .with_solver(crate::linalg::EigenSolverKind::Subspace);
        let err = ModalModelBuilder::new(steel(), params)
            .with_cancellation(token)
            .build(&mesh, &[0])
            .unwrap_err();
        assert!(matches!(err, ModalError::Cancelled));
    }
}
