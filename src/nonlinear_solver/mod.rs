pub mod convergence;
pub mod newton;
