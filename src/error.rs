use thiserror::Error;

/// Convenience alias for `Result`s that fail with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// The platform's single typed error surface. Every component returns one of
/// these variants; the orchestrator is the only place that translates a
/// `CoreError` into a user-facing `status` string (see
/// [`crate::orchestrator::ProcessResponse`]).
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("internal agent '{0}' registered without an invocable reference")]
    InstanceMissing(String),

    #[error("authentication failed for '{agent_id}': {reason}")]
    AuthFailed { agent_id: String, reason: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("pre-check failed for field '{field}' in scope '{scope}': {message}")]
    PreCheckFailed {
        scope: String,
        field: String,
        message: String,
    },

    #[error("clarification needed: {0}")]
    ClarificationNeeded(String),

    #[error("confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Maps a typed error onto the orchestrator's response `status` strings.
    pub fn response_status(&self) -> &'static str {
        match self {
            CoreError::ClarificationNeeded(_) => "clarification_needed",
            CoreError::PreCheckFailed { .. } => "validation_failed",
            CoreError::PermissionDenied(_) | CoreError::AuthFailed { .. } => "permission_denied",
            CoreError::ConfirmationRequired(_) => "confirmation_required",
            CoreError::NotFound(_) => "not_implemented",
            _ => "failed",
        }
    }
}
