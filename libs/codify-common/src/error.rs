use thiserror::Error;

/// Infrastructure failure at the submission store boundary.
///
/// The in-memory store never produces these, but real backends (and the
/// fault-injecting stores used in tests) do, and the drain loop converts
/// them into a terminal `error` status instead of crashing.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Rejection reasons surfaced synchronously by `submit`, before any row is
/// created. Maps onto HTTP 400 / 409 / 500 at the API layer.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),

    #[error("User already has a submission being graded")]
    Conflict,

    #[error(transparent)]
    Store(#[from] StoreError),
}
