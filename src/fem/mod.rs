pub mod dof;
pub mod assembly;

pub use dof::DofManager;
pub use assembly::Assembler;
