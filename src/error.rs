use thiserror::Error;

#[derive(Error, Debug)]
pub enum TapatiteError {
    #[error("bad batch at line {line}: {reason}")]
    BadBatch { line: usize, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("MELTS equilibration failed to produce output: {0}")]
    SimulationFailed(String),

    #[error("MELTS equilibration failed to calculate liquid composition: {0}")]
    NoLiquid(String),

    #[error("phase {phase} has no {column} column")]
    MissingColumn { phase: String, column: String },

    #[error("melt trace has no rows")]
    EmptyTrace,

    #[error("all workers exited before the batch was drained")]
    WorkersGone,

    #[error("worker {0} stopped accepting tasks")]
    WorkerLost(usize),

    #[error("result collector stopped before the batch was drained")]
    CollectorGone,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TapatiteError {
    /// Errors that cost one composition but leave the run intact.
    pub fn is_per_task(&self) -> bool {
        matches!(
            self,
            TapatiteError::SimulationFailed(_)
                | TapatiteError::NoLiquid(_)
                | TapatiteError::MissingColumn { .. }
                | TapatiteError::EmptyTrace
        )
    }
}
