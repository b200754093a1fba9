/// Surface → volume → modal model pipeline driven from an interactive loop
///
/// Volume generation and modal analysis run as background tasks. The
/// owning thread calls `update` once per frame; finished volumes are swapped
/// in there, so readers never see a half-built mesh. A failed run leaves
/// the previous volumetric mesh in place. Results of runs launched before
/// the surface or volume they were built from was replaced are discarded.

use std::sync::Arc;

use crate::error::{ModalError, Result};
use crate::excitation::{ExcitationChannels, SharedRouter, DEFAULT_CHANNELS};
use crate::mesh::{PolyhedralMesh, VolumetricMesh};
use crate::modal::{MaterialProperties, ModalModel, ModalModelBuilder, ModalParams};
use crate::task::{BackgroundTask, TaskPoll};
use crate::volume::{Plc, TetQuality, VolumeGenerator};

/// Something `update` observed this frame
#[derive(Debug)]
pub enum PipelineEvent {
    VolumeReady { vertices: usize, tetrahedra: usize },
    VolumeFailed(ModalError),
    /// The model is handed over; the pipeline keeps no copy
    ModalReady(ModalModel),
    ModalFailed(ModalError),
}

pub struct Pipeline {
    surface: PolyhedralMesh,
    volume: Option<Arc<VolumetricMesh>>,
    channels: ExcitationChannels,
    channel_count: usize,
    generator: VolumeGenerator,
    volume_task: BackgroundTask<VolumetricMesh>,
    modal_task: BackgroundTask<ModalModel>,
    router: SharedRouter,
    /// Bumped whenever the surface is replaced
    surface_generation: u64,
    /// Bumped whenever the live volume is replaced or cleared
    volume_generation: u64,
    volume_launched_at: u64,
    modal_launched_at: u64,
}

impl Pipeline {
    pub fn new(surface: PolyhedralMesh) -> Self {
        Self {
            surface,
            volume: None,
            channels: ExcitationChannels::default(),
            channel_count: DEFAULT_CHANNELS,
            generator: VolumeGenerator::new(),
            volume_task: BackgroundTask::new("volume-generator"),
            modal_task: BackgroundTask::new("modal-builder"),
            router: SharedRouter::default(),
            surface_generation: 0,
            volume_generation: 0,
            volume_launched_at: 0,
            modal_launched_at: 0,
        }
    }

    pub fn with_generator(mut self, generator: VolumeGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn surface(&self) -> &PolyhedralMesh {
        &self.surface
    }

    /// Replace the source surface; the derived volume no longer applies
    ///
    /// Runs still in flight for the old surface are cancelled and their
    /// results dropped when they complete.
    pub fn set_surface(&mut self, surface: PolyhedralMesh) {
        self.surface = surface;
        self.surface_generation += 1;
        self.volume_generation += 1;
        self.volume_task.cancel();
        self.modal_task.cancel();
        self.volume = None;
        self.channels = ExcitationChannels::default();
        self.router.lock().clear_channels();
    }

    pub fn volume(&self) -> Option<&Arc<VolumetricMesh>> {
        self.volume.as_ref()
    }

    pub fn channels(&self) -> &ExcitationChannels {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Router fed with the current channel table
    pub fn router(&self) -> SharedRouter {
        self.router.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.volume_task.is_running() || self.modal_task.is_running()
    }

    /// Change the number of excitation channels and resample
    pub fn set_channel_count(&mut self, count: usize) {
        self.channel_count = count;
        self.resample_channels();
    }

    /// Start tetrahedralizing the current surface
    ///
    /// The surface is validated here so an open or degenerate surface is
    /// reported without launching anything.
    pub fn request_volume(&mut self, quality: TetQuality) -> Result<()> {
        let plc = Plc::from_mesh(&self.surface)?;
        let generator = self.generator.clone();
        self.volume_task
            .launch(move |_token| generator.generate(&plc, quality))?;
        self.volume_launched_at = self.surface_generation;
        Ok(())
    }

    /// Start a modal build of the current volume with an explicit material
    pub fn request_modal(&mut self, material: MaterialProperties, params: ModalParams) -> Result<()> {
        let mesh = self.volume.clone().ok_or(ModalError::EmptyVolume)?;
        let channels = self.channels.indices().to_vec();
        self.modal_task.launch(move |token| {
            ModalModelBuilder::new(material, params)
                .with_cancellation(token)
                .build(&mesh, &channels)
        })?;
        self.modal_launched_at = self.volume_generation;
        Ok(())
    }

    /// Ask a running modal build to stop
    pub fn cancel_modal(&self) {
        self.modal_task.cancel();
    }

    /// Poll both tasks; call once per frame
    pub fn update(&mut self) -> Vec<PipelineEvent> {
        let volume = self.volume_task.poll();
        let modal = self.modal_task.poll();
        self.collect(volume, modal)
    }

    /// Block until both tasks are idle
    pub fn wait(&mut self) -> Vec<PipelineEvent> {
        let volume = self.volume_task.wait();
        let modal = self.modal_task.wait();
        self.collect(volume, modal)
    }

    fn collect(&mut self, volume: TaskPoll<VolumetricMesh>, modal: TaskPoll<ModalModel>) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        if let TaskPoll::Completed(result) = volume {
            if self.volume_launched_at != self.surface_generation {
                log::debug!("discarding volume built for a replaced surface");
            } else {
                events.push(self.install_volume(result));
            }
        }
        if let TaskPoll::Completed(result) = modal {
            if self.modal_launched_at != self.volume_generation {
                log::debug!("discarding modal model built for a replaced volume");
            } else {
                events.push(match result {
                    Ok(model) => PipelineEvent::ModalReady(model),
                    Err(e) => PipelineEvent::ModalFailed(e),
                });
            }
        }
        events
    }

    fn install_volume(&mut self, result: Result<VolumetricMesh>) -> PipelineEvent {
        match result {
            Ok(mesh) => {
                let event = PipelineEvent::VolumeReady {
                    vertices: mesh.num_vertices(),
                    tetrahedra: mesh.num_tetrahedra(),
                };
                self.volume = Some(Arc::new(mesh));
                self.volume_generation += 1;
                self.resample_channels();
                event
            }
            Err(e) => {
                log::warn!("volume generation failed, keeping previous mesh: {}", e);
                PipelineEvent::VolumeFailed(e)
            }
        }
    }

    fn resample_channels(&mut self) {
        let Some(mesh) = &self.volume else {
            return;
        };
        self.channels = ExcitationChannels::sample(mesh, self.channel_count);
        self.router
            .lock()
            .set_channels(Arc::clone(mesh), self.channels.clone());
        log::debug!("resampled {} excitation channels", self.channels.len());
    }
}
