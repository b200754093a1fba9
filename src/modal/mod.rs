pub mod material;
pub mod params;
pub mod model;
pub mod builder;
pub mod synthesis;

pub use material::{MaterialPreset, MaterialProperties, DEFAULT_MATERIAL};
pub use params::{ModalParams, ModeSelection, RIGID_BODY_MODES};
pub use model::{ModalModel, Mode};
pub use builder::ModalModelBuilder;
pub use synthesis::{SynthesisProgram, POSITION_CONTROL, VALUE_CONTROL};
