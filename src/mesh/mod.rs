pub mod polyhedral;
pub mod obj;
pub mod io;
pub mod profile;
pub mod topology;
pub mod tet;
pub mod quality;
pub mod view;

pub use polyhedral::PolyhedralMesh;
pub use io::MeshFormat;
pub use profile::{Profile, ProfileOptions};
pub use topology::TetElement;
pub use tet::VolumetricMesh;
pub use quality::{MeshQuality, assess_mesh_quality, compute_tet_jacobian};
pub use view::{ActiveGeometry, ViewMode};
