use thiserror::Error;

/// Application-level error carrying the process exit code.
///
/// Exit codes: 2 = invalid input/configuration, 3 = solver failure,
/// 4 = terminal/IO failure.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<SolverError> for AppError {
    fn from(err: SolverError) -> Self {
        AppError::new(3, format!("Solver failed: {err}"))
    }
}

/// Failures of the segmented least squares solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("need at least 2 points to segment, got {n}")]
    TooFewPoints { n: usize },
    #[error("penalty must be finite and >= 0, got {0}")]
    InvalidPenalty(f64),
    #[error("point indices must be contiguous from 0; index {missing} is missing")]
    IndexGap { missing: usize },
    #[error("another run already owns this model")]
    ConcurrentRun,
    #[error("this run no longer owns the model")]
    RunNotActive,
    #[error("points changed while the run was in progress")]
    PointsChanged,
    #[error("run cancelled after prefix {prefix}")]
    Cancelled { prefix: usize },
}

/// Failures reported by observers while handling a model event.
#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("render failed: {0}")]
    Render(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
