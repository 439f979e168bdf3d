use mediagen_generation::StoreError;

/// Reasons a job routine stops without producing an outcome.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The job's cancellation token fired.
    #[error("Cancelled")]
    Cancelled,

    #[error("Failed to save image metadata: {0}")]
    Store(#[from] StoreError),
}
