pub mod error;
pub mod geometry;
pub mod mesh;
pub mod volume;
pub mod mechanics;
pub mod fem;
pub mod linalg;
pub mod modal;
pub mod excitation;
pub mod task;
pub mod scene;
pub mod pipeline;
pub mod config;

pub use error::{ModalError, Result};
pub use geometry::{convex_hull, Aabb};
pub use mesh::{ActiveGeometry, MeshFormat, MeshQuality, PolyhedralMesh, Profile, ProfileOptions, ViewMode, VolumetricMesh};
pub use volume::{tetrahedralize, Plc, TetQuality, VolumeGenerator};
pub use mechanics::IsotropicElasticity;
pub use fem::{Assembler, DofManager};
pub use linalg::{EigenSolverKind, GeneralizedEigenSolver};
pub use modal::{MaterialPreset, MaterialProperties, ModalModel, ModalModelBuilder, ModalParams, ModeSelection, Mode, SynthesisProgram};
pub use excitation::{ContactPoint, ExcitationChannels, ExcitationEvent, ExcitationRouter, RouterState, SharedRouter};
pub use task::{BackgroundTask, CancellationToken, TaskPoll, TaskState};
pub use scene::{NodeId, SceneGraph, SceneNode, Transform};
pub use pipeline::{Pipeline, PipelineEvent};
pub use config::ModalConfig;
