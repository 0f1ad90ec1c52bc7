use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReputationError>;

/// Errors surfaced by the reputation engine.
#[derive(Debug, Error)]
pub enum ReputationError {
    /// Bad input rejected before any state change (self-endorsement,
    /// unknown status string, missing fields).
    #[error("invalid input: {0}")]
    Validation(String),

    /// The same giver already endorsed this receiver for this session.
    #[error("already endorsed this user for this session")]
    DuplicateEndorsement,

    /// A lifecycle operation was attempted against the wrong state
    /// (starting a non-scheduled session, completing one without timestamps).
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),
}
