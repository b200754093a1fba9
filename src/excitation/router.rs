/// Excitation routing
///
/// Maps picked vertices and physics contacts onto the nearest excitation
/// channel and forwards `(position, value)` pairs to the synthesis runtime.
/// The router behaves as a monophonic gate: at most one channel is active.

use crossbeam_channel::{Sender, TrySendError};
use nalgebra::Point3;
use std::sync::{Arc, Mutex, MutexGuard};

use super::channels::ExcitationChannels;
use super::contact::ContactPoint;
use crate::mesh::VolumetricMesh;
use crate::scene::Transform;

/// Control values for the synthesis runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcitationEvent {
    /// Channel index
    pub position: usize,
    /// Intensity in [-1, 1]; 0 releases
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RouterState {
    #[default]
    Idle,
    Triggered { channel: usize, intensity: f64 },
}

#[derive(Debug, Default)]
pub struct ExcitationRouter {
    mesh: Option<Arc<VolumetricMesh>>,
    channels: ExcitationChannels,
    sender: Option<Sender<ExcitationEvent>>,
    state: RouterState,
}

impl ExcitationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the channel table sampled from `mesh`; any active trigger is released
    pub fn set_channels(&mut self, mesh: Arc<VolumetricMesh>, channels: ExcitationChannels) {
        self.release();
        self.mesh = Some(mesh);
        self.channels = channels;
    }

    pub fn clear_channels(&mut self) {
        self.release();
        self.mesh = None;
        self.channels = ExcitationChannels::default();
    }

    pub fn channels(&self) -> &ExcitationChannels {
        &self.channels
    }

    /// Connect a running synthesis program
    pub fn attach(&mut self, sender: Sender<ExcitationEvent>) {
        self.sender = Some(sender);
        log::debug!("excitation router attached");
    }

    pub fn detach(&mut self) {
        self.release();
        self.sender = None;
        self.state = RouterState::Idle;
    }

    pub fn is_attached(&self) -> bool {
        self.sender.is_some()
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    /// Current output intensity (0 when idle)
    pub fn intensity(&self) -> f64 {
        match self.state {
            RouterState::Idle => 0.0,
            RouterState::Triggered { intensity, .. } => intensity,
        }
    }

    /// Channel nearest to `point` in mesh-local space
    pub fn nearest_channel(&self, point: &Point3<f64>) -> Option<usize> {
        self.channels.nearest(point)
    }

    /// Strike the channel nearest to volumetric-mesh vertex `vertex`
    pub fn trigger(&mut self, vertex: usize, intensity: f64) -> Option<ExcitationEvent> {
        let point = match self.mesh.as_ref().and_then(|m| m.points.get(vertex)) {
            Some(p) => *p,
            None => {
                log::debug!("trigger ignored: vertex {} not in the volumetric mesh", vertex);
                return None;
            }
        };
        self.trigger_at(&point, intensity)
    }

    /// Strike the channel nearest to a mesh-local point
    pub fn trigger_at(&mut self, point: &Point3<f64>, intensity: f64) -> Option<ExcitationEvent> {
        if self.sender.is_none() {
            return None;
        }
        let channel = self.nearest_channel(point)?;
        let value = if intensity.is_finite() {
            intensity.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let event = ExcitationEvent {
            position: channel,
            value,
        };
        if !self.emit(event) {
            return None;
        }
        self.state = RouterState::Triggered {
            channel,
            intensity: value,
        };
        Some(event)
    }

    /// Strike from a physics contact given in world space
    ///
    /// `world` is the mesh's world transform; `impulse_scale` maps impulse
    /// magnitude onto intensity.
    pub fn trigger_contact(
        &mut self,
        contact: &ContactPoint,
        world: &Transform,
        impulse_scale: f64,
    ) -> Option<ExcitationEvent> {
        let local = contact.local_point(world)?;
        self.trigger_at(&local, contact.intensity(impulse_scale))
    }

    /// Zero the last triggered channel
    ///
    /// The gate stays triggered until the zero event is queued, so a
    /// release dropped on a full queue can be retried.
    pub fn release(&mut self) -> Option<ExcitationEvent> {
        let RouterState::Triggered { channel, .. } = self.state else {
            return None;
        };
        let event = ExcitationEvent {
            position: channel,
            value: 0.0,
        };
        if self.emit(event) {
            self.state = RouterState::Idle;
            return Some(event);
        }
        if self.sender.is_none() {
            self.state = RouterState::Idle;
        }
        None
    }

    /// Non-blocking send; a vanished receiver detaches the router
    fn emit(&mut self, event: ExcitationEvent) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("excitation event dropped: runtime queue full");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("synthesis runtime went away; detaching router");
                self.sender = None;
                false
            }
        }
    }
}

/// Router shared between the UI thread and physics callbacks
///
/// Every call takes the lock, so events reach the runtime in call order.
#[derive(Debug, Clone, Default)]
pub struct SharedRouter(Arc<Mutex<ExcitationRouter>>);

impl SharedRouter {
    pub fn new(router: ExcitationRouter) -> Self {
        Self(Arc::new(Mutex::new(router)))
    }

    /// Lock the router, recovering from a poisoned lock
    pub fn lock(&self) -> MutexGuard<'_, ExcitationRouter> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn trigger(&self, vertex: usize, intensity: f64) -> Option<ExcitationEvent> {
        self.lock().trigger(vertex, intensity)
    }

    pub fn trigger_at(&self, point: &Point3<f64>, intensity: f64) -> Option<ExcitationEvent> {
        self.lock().trigger_at(point, intensity)
    }

    pub fn trigger_contact(
        &self,
        contact: &ContactPoint,
        world: &Transform,
        impulse_scale: f64,
    ) -> Option<ExcitationEvent> {
        self.lock().trigger_contact(contact, world, impulse_scale)
    }

    pub fn release(&self) -> Option<ExcitationEvent> {
        self.lock().release()
    }

    pub fn state(&self) -> RouterState {
        self.lock().state()
    }
}
