use serde::{Deserialize, Serialize};

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared errors
/// - E1xxx: Session errors
/// - E2xxx: Discovery errors
/// - E3xxx: Interaction ledger errors
/// - E4xxx: Messaging errors
/// - E5xxx: Notification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationFailed,
    NotFound,
    FetchFailed,

    // Session (E1xxx)
    NotAuthenticated,

    // Discovery (E2xxx)
    ProfileNotFound,
    ProfileIncomplete,
    StaleReference,

    // Ledger (E3xxx)
    DuplicateLike,
    LikeNotFound,
    MatchNotFound,

    // Messaging (E4xxx)
    NotMatchMember,
    MessageNotFound,

    // Notification (E5xxx)
    NotificationNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationFailed => "E0002",
            Self::NotFound => "E0003",
            Self::FetchFailed => "E0004",

            // Session
            Self::NotAuthenticated => "E1001",

            // Discovery
            Self::ProfileNotFound => "E2001",
            Self::ProfileIncomplete => "E2002",
            Self::StaleReference => "E2003",

            // Ledger
            Self::DuplicateLike => "E3001",
            Self::LikeNotFound => "E3002",
            Self::MatchNotFound => "E3003",

            // Messaging
            Self::NotMatchMember => "E4001",
            Self::MessageNotFound => "E4002",

            // Notification
            Self::NotificationNotFound => "E5001",
        }
    }

    /// Whether a caller may safely re-issue the failed operation.
    ///
    /// Mutations are never retried automatically (a retried like insert
    /// would trip the unique-pair constraint); transient fetch failures
    /// are left to the caller's retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal error")]
    Internal(#[from] anyhow::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated, "no authenticated user")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FetchFailed, message)
    }

    pub fn stale_reference(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StaleReference, message)
    }

    /// The code for a known error, `InternalError`/`ValidationFailed`
    /// for the catch-all variants.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Known { code, .. } => *code,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Validation(_) => ErrorCode::ValidationFailed,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
