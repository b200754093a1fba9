//! Excitation channels and the trigger/release router

pub mod channels;
pub mod contact;
pub mod router;

pub use channels::{ExcitationChannels, DEFAULT_CHANNELS, MAX_CHANNELS};
pub use contact::ContactPoint;
pub use router::{ExcitationEvent, ExcitationRouter, RouterState, SharedRouter};
