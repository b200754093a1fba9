pub mod solver;
pub mod iterative;
pub mod preconditioner;
pub mod eigen;

pub use solver::{LinearOperator, ShiftedOperator, Solver, SolverStats, SolverUtils};
pub use iterative::ConjugateGradient;
pub use preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
pub use eigen::{dense_generalized_eigen, EigenSolution, EigenSolverKind, GeneralizedEigenSolver, DENSE_DOF_LIMIT};
