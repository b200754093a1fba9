use nalgebra::SMatrix;
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

use crate::fem::DofManager;
use crate::mechanics::{ElasticityElement, IsotropicElasticity};
use crate::mesh::VolumetricMesh;

/// Global matrix assembler
pub struct Assembler;

impl Assembler {
    /// Add a 12×12 element matrix to the global triplets
    fn scatter(
        triplets: &mut TriMat<f64>,
        dof_mgr: &DofManager,
        nodes: &[usize; 4],
        elem: &SMatrix<f64, 12, 12>,
    ) {
        for i in 0..4 {
            for local_dof_i in 0..3 {
                let global_i = dof_mgr.global_dof(nodes[i], local_dof_i);
                for j in 0..4 {
                    for local_dof_j in 0..3 {
                        let global_j = dof_mgr.global_dof(nodes[j], local_dof_j);
                        let value = elem[(3 * i + local_dof_i, 3 * j + local_dof_j)];
                        if value != 0.0 {
                            triplets.add_triplet(global_i, global_j, value);
                        }
                    }
                }
            }
        }
    }

    /// Assemble global stiffness matrix for elasticity (serial)
    ///
    /// K = Σ_e K_e, each K_e is 12×12 (4 nodes × 3 displacement DOFs)
    #[allow(non_snake_case)]
    pub fn assemble_elasticity_stiffness_serial(
        mesh: &VolumetricMesh,
        dof_mgr: &DofManager,
        material: &IsotropicElasticity,
    ) -> CsMat<f64> {
        let n_dofs = dof_mgr.total_dofs();
        let mut triplets = TriMat::new((n_dofs, n_dofs));

        for elem in &mesh.tets {
            let vertices = elem.corners(&mesh.points);
            let K_elem = ElasticityElement::stiffness_matrix(&vertices, material);
            Self::scatter(&mut triplets, dof_mgr, &elem.nodes, &K_elem);
        }

        triplets.to_csr()
    }

    /// Assemble global stiffness matrix for elasticity (parallel)
    ///
    /// Element matrices are computed with Rayon, then scattered in element
    /// order so the result matches the serial version exactly.
    #[allow(non_snake_case)]
    pub fn assemble_elasticity_stiffness_parallel(
        mesh: &VolumetricMesh,
        dof_mgr: &DofManager,
        material: &IsotropicElasticity,
    ) -> CsMat<f64> {
        let element_matrices: Vec<_> = mesh
            .tets
            .par_iter()
            .map(|elem| {
                let vertices = elem.corners(&mesh.points);
                ElasticityElement::stiffness_matrix(&vertices, material)
            })
            .collect();

        Self::merge(mesh, dof_mgr, &element_matrices)
    }

    /// Assemble global consistent mass matrix (parallel)
    pub fn assemble_mass_parallel(
        mesh: &VolumetricMesh,
        dof_mgr: &DofManager,
        density: f64,
    ) -> CsMat<f64> {
        let element_matrices: Vec<_> = mesh
            .tets
            .par_iter()
            .map(|elem| ElasticityElement::mass_matrix(&elem.corners(&mesh.points), density))
            .collect();

        Self::merge(mesh, dof_mgr, &element_matrices)
    }

    fn merge(
        mesh: &VolumetricMesh,
        dof_mgr: &DofManager,
        element_matrices: &[SMatrix<f64, 12, 12>],
    ) -> CsMat<f64> {
        let n_dofs = dof_mgr.total_dofs();
        let mut triplets = TriMat::with_capacity((n_dofs, n_dofs), 144 * mesh.tets.len());
        for (elem, matrix) in mesh.tets.iter().zip(element_matrices) {
            Self::scatter(&mut triplets, dof_mgr, &elem.nodes, matrix);
        }
        triplets.to_csr()
    }

    /// Stiffness and mass of the free-free body
    #[allow(non_snake_case)]
    pub fn assemble_modal_system(
        mesh: &VolumetricMesh,
        material: &IsotropicElasticity,
        density: f64,
    ) -> (CsMat<f64>, CsMat<f64>) {
        let dof_mgr = DofManager::elasticity(mesh.num_vertices());
        let (K, M) = rayon::join(
            || Self::assemble_elasticity_stiffness_parallel(mesh, &dof_mgr, material),
            || Self::assemble_mass_parallel(mesh, &dof_mgr, density),
        );
        log::debug!(
            "assembled {} DOFs: K nnz = {}, M nnz = {}",
            dof_mgr.total_dofs(),
            K.nnz(),
            M.nnz()
        );
        (K, M)
    }
}
