pub mod config;
pub mod implicit_euler;
pub mod problem;
pub mod solution;
