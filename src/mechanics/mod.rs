/// Solid mechanics for the vibrating body
///
/// This module provides:
/// - Linear elastic constitutive model
/// - Strain-displacement relationship of the linear tetrahedron
/// - Element stiffness and consistent mass matrices

pub mod constitutive;
pub mod strain;
pub mod element;

pub use constitutive::IsotropicElasticity;
pub use strain::StrainDisplacement;
pub use element::ElasticityElement;
