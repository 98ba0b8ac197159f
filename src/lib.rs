//! # genmodels
//!
//! Generated ODE/DAE model functions sharing a single calling convention, `(out, t, x, p, k)`, so that
//! any model can be evaluated once it has been looked up by name. Models are written as
//! `M x' = f(x, t)`, where a zero on the diagonal of the mass matrix `M` marks an algebraic state.
//!
//! The crate also provides the operators and a variable step backward Euler integrator needed to
//! solve a model:
//!
//! ```rust
//! use genmodels::{ImplicitEuler, ModelProblem, ModelRegistry};
//!
//! let registry = ModelRegistry::<f64>::builtin();
//! let problem = ModelProblem::from_registry(&registry, "robertson").unwrap();
//! let soln = ImplicitEuler::new().solve(&problem, &[0.4]).unwrap();
//! let x3 = soln.state_by_id("x3").unwrap();
//! assert!((x3[0] - 1.4794e-2).abs() < 1e-3);
//! ```

pub mod error;
pub mod logging;
pub mod model;
pub mod nonlinear_solver;
pub mod ode_solver;
pub mod op;
pub mod parameter_scaling;
pub mod scalar;

pub use error::ModelError;
pub use model::{
    registry::ModelRegistry, InitialFunction, ModelDefinition, ModelFunction, StateKind,
};
pub use nonlinear_solver::{
    convergence::{Convergence, ConvergenceStatus},
    newton::{JacobianUpdate, NewtonNonlinearSolver},
};
pub use ode_solver::{
    config::SolverOptions,
    implicit_euler::ImplicitEuler,
    problem::ModelProblem,
    solution::{Solution, SolverStatistics},
};
pub use op::{
    implicit_euler::ImplicitEulerOp, mass::MassOp, rhs::RhsOp, LinearOp, NonLinearOp, Op,
    OpStatistics,
};
pub use parameter_scaling::ParameterScaling;
pub use scalar::{IndexType, Scalar};
