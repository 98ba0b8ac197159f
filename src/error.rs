use thiserror::Error;

/// Custom error type for genmodels
///
/// This error type is used to wrap all possible errors that can occur when evaluating or integrating a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Non-linear solver error: {0}")]
    NonLinearSolverError(#[from] NonLinearSolverError),
    #[error("ODE solver error: {0}")]
    OdeSolverError(#[from] OdeSolverError),
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Unknown state id: {0}")]
    UnknownStateId(String),
    #[error("Unknown parameter scaling: {0}")]
    UnknownScaling(String),
    #[error("Buffer too small for {name}: expected at least {expected} elements, got {found}")]
    BufferTooSmall {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{name} has wrong length: expected {expected}, got {found}")]
    WrongLength {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Initial conditions are not consistent: algebraic residual {residual} in state {index}")]
    InconsistentInitialConditions { index: usize, residual: f64 },
    #[error("Invalid log level {0:?}, expected one of OFF, ERROR, WARN, INFO, DEBUG, TRACE or an integer 0-5")]
    InvalidLogLevel(String),
    #[error("Error: {0}")]
    Other(String),
}

/// Possible errors that can occur when solving a non-linear problem
#[derive(Error, Debug)]
pub enum NonLinearSolverError {
    #[error("Newton iterations did not converge")]
    NewtonDidNotConverge,
    #[error("LU solve failed")]
    LuSolveFailed,
    #[error("State has wrong length: expected {expected}, got {found}")]
    WrongStateLength { expected: usize, found: usize },
    #[error("Error: {0}")]
    Other(String),
}

/// Possible errors that can occur when integrating a model
#[derive(Debug, Error)]
pub enum OdeSolverError {
    #[error(
        "Stop time = {} is less than current state time = {}",
        stop_time,
        state_time
    )]
    StopTimeBeforeCurrentTime { stop_time: f64, state_time: f64 },
    #[error("Step size is too small at time = {time}")]
    StepSizeTooSmall { time: f64 },
    #[error("Exceeded maximum number of steps ({max_steps}) at time = {time}")]
    TooManySteps { max_steps: usize, time: f64 },
    #[error("Invalid solver options: {0}")]
    InvalidOptions(String),
    #[error("Time {0} is not finite")]
    NonFiniteTime(f64),
}

#[macro_export]
macro_rules! non_linear_solver_error {
    ($variant:ident) => {
        ModelError::from(NonLinearSolverError::$variant)
    };
    ($variant:ident, $($arg:tt)*) => {
        ModelError::from(NonLinearSolverError::$variant($($arg)*))
    };
}

#[macro_export]
macro_rules! ode_solver_error {
    ($variant:ident) => {
        ModelError::from(OdeSolverError::$variant)
    };
    ($variant:ident, $($arg:tt)*) => {
        ModelError::from(OdeSolverError::$variant($($arg)*.to_string()))
    };
}
