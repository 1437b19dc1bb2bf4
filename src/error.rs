use thiserror::Error;

/// Main error type for the ticket bot
#[derive(Error, Debug)]
pub enum MatchdayError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    // Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    // Admission queue errors
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    // Acquisition errors
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    // Session release errors (logged and swallowed by the pipeline)
    #[error("Cleanup error: {0}")]
    Cleanup(String),

    // Page/session driver errors
    #[error("Driver error: {0}")]
    Driver(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MatchdayError
pub type Result<T> = std::result::Result<T, MatchdayError>;

/// Terminal outcomes of the admission queue state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Failed to enter queue: {0}")]
    EntryFailed(String),

    #[error("Lost position in queue")]
    Lost,

    #[error("Timeout waiting for queue access")]
    TimedOut,
}

impl MatchdayError {
    /// True when the error came from the network edge rather than the
    /// upstream system's own refusal.
    pub fn is_transport(&self) -> bool {
        matches!(self, MatchdayError::Transport(_) | MatchdayError::Timeout(_))
    }
}
