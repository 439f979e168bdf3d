/// Errors reported by a generation backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The caller's cancellation token fired while the call was in flight.
    #[error("Generation cancelled")]
    Cancelled,

    #[error("No images generated")]
    NoOutput,

    #[error("Failed to decode backend output: {0}")]
    Decode(String),

    #[error("Failed to write output file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the artifact metadata store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
