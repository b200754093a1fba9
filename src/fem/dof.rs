use nalgebra::Vector3;

/// Degree of Freedom (DOF) manager
///
/// Interleaved numbering: DOF `node * dofs_per_node + component`. The
/// vibrating body is free-free, so no DOF is constrained.
#[derive(Debug, Clone, Copy)]
pub struct DofManager {
    num_nodes: usize,
    dofs_per_node: usize,
}

impl DofManager {
    pub fn new(num_nodes: usize, dofs_per_node: usize) -> Self {
        Self {
            num_nodes,
            dofs_per_node,
        }
    }

    /// Three displacement components per node
    pub fn elasticity(num_nodes: usize) -> Self {
        Self::new(num_nodes, 3)
    }

    /// Global DOF index for a node and component
    pub fn global_dof(&self, node_id: usize, component: usize) -> usize {
        debug_assert!(node_id < self.num_nodes);
        debug_assert!(component < self.dofs_per_node);
        node_id * self.dofs_per_node + component
    }

    pub fn total_dofs(&self) -> usize {
        self.num_nodes * self.dofs_per_node
    }

    pub fn dofs_per_node(&self) -> usize {
        self.dofs_per_node
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Displacement vector of `node_id` read from a global field
    pub fn node_vector(&self, field: &[f64], node_id: usize) -> Vector3<f64> {
        debug_assert_eq!(self.dofs_per_node, 3);
        let base = self.global_dof(node_id, 0);
        Vector3::new(field[base], field[base + 1], field[base + 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_dof_numbering() {
        let dof_mgr = DofManager::elasticity(10);

        assert_eq!(dof_mgr.total_dofs(), 30);
        assert_eq!(dof_mgr.global_dof(0, 2), 2);
        assert_eq!(dof_mgr.global_dof(1, 0), 3);
        assert_eq!(dof_mgr.global_dof(9, 2), 29);
    }

    #[test]
    fn test_node_vector() {
        let dof_mgr = DofManager::elasticity(2);
        let field = [0.0, 0.0, 0.0, 1.0, -2.0, 3.0];
        assert_eq!(dof_mgr.node_vector(&field, 1), Vector3::new(1.0, -2.0, 3.0));
    }
}
