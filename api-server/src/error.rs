use std::fmt;

use actix_web::http::StatusCode;

/// Failure of one API call. Every variant is terminal for the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LedgerError {
    InvalidInput(String),
    NotFound(String),
    AlreadyCompleted(String),
    Throttled {
        message: &'static str,
        retry_after_secs: u64,
    },
    StoreFailure(String),
}

impl LedgerError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyCompleted(_) => StatusCode::CONFLICT,
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::AlreadyCompleted(_) => "already_completed",
            Self::Throttled { .. } => "throttled",
            Self::StoreFailure(_) => "internal_error",
        }
    }

    /// Message safe to show a client. Store details stay in the logs.
    pub(crate) fn public_message(&self) -> String {
        match self {
            Self::StoreFailure(_) => "session store error".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "{msg}"),
            Self::NotFound(msg) => write!(f, "{msg}"),
            Self::AlreadyCompleted(session_id) => {
                write!(f, "game session already completed: {session_id}")
            }
            Self::Throttled {
                message,
                retry_after_secs,
            } => write!(f, "{message} (retry after {retry_after_secs}s)"),
            Self::StoreFailure(msg) => write!(f, "store failure: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}
