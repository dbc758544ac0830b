//! Core error sum type.
//!
//! Every orchestration failure is one of these variants. The HTTP facade is
//! the sole place that translates a `PoolError` into a status code; the core
//! never reaches for an HTTP type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("pool is inactive and admits no new work")]
    PoolInactive,

    #[error("a pool with this configuration already exists: {pool_id}")]
    PoolAlreadyExists { pool_id: String },

    #[error("pool not found: {pool_id}")]
    PoolNotFound { pool_id: String },

    #[error("pool capacity reached: {max_browsers} browsers")]
    PoolCapacityReached { max_browsers: usize },

    #[error("no available browser and scale-up is not possible")]
    NoAvailableBrowser,

    #[error("failed to launch browser: {message}")]
    LaunchFailed { message: String },

    #[error("action '{action}' failed on session {session_id}: {message}")]
    ActionFailure {
        session_id: String,
        action: String,
        message: String,
    },

    #[error("operation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("invalid session id: {session_id}")]
    InvalidSessionId { session_id: String },

    #[error("page session not found: {session_id}")]
    PageSessionNotFound { session_id: String },

    #[error("bad params for action '{action}': {message}")]
    BadParams { action: String, message: String },
}

impl PoolError {
    pub fn pool_already_exists<S: Into<String>>(pool_id: S) -> Self {
        Self::PoolAlreadyExists {
            pool_id: pool_id.into(),
        }
    }

    pub fn pool_not_found<S: Into<String>>(pool_id: S) -> Self {
        Self::PoolNotFound {
            pool_id: pool_id.into(),
        }
    }

    pub fn launch_failed<S: Into<String>>(message: S) -> Self {
        Self::LaunchFailed {
            message: message.into(),
        }
    }

    pub fn action_failure<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        session_id: S1,
        action: S2,
        message: S3,
    ) -> Self {
        Self::ActionFailure {
            session_id: session_id.into(),
            action: action.into(),
            message: message.into(),
        }
    }

    pub fn invalid_session_id<S: Into<String>>(session_id: S) -> Self {
        Self::InvalidSessionId {
            session_id: session_id.into(),
        }
    }

    pub fn page_session_not_found<S: Into<String>>(session_id: S) -> Self {
        Self::PageSessionNotFound {
            session_id: session_id.into(),
        }
    }

    pub fn bad_params<S1: Into<String>, S2: Into<String>>(action: S1, message: S2) -> Self {
        Self::BadParams {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Stable, client-facing error type string (used for logging and the
    /// HTTP error body's `type` field).
    pub fn error_type(&self) -> &'static str {
        match self {
            PoolError::PoolInactive => "pool_inactive",
            PoolError::PoolAlreadyExists { .. } => "pool_already_exists",
            PoolError::PoolNotFound { .. } => "pool_not_found",
            PoolError::PoolCapacityReached { .. } => "pool_capacity_reached",
            PoolError::NoAvailableBrowser => "no_available_browser",
            PoolError::LaunchFailed { .. } => "launch_failed",
            PoolError::ActionFailure { .. } => "action_failure",
            PoolError::Timeout { .. } => "timeout",
            PoolError::RateLimitExceeded => "rate_limit_exceeded",
            PoolError::InvalidSessionId { .. } => "invalid_session_id",
            PoolError::PageSessionNotFound { .. } => "page_session_not_found",
            PoolError::BadParams { .. } => "bad_params",
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
