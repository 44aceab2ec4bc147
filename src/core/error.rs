//! Error taxonomy for tracker operations
//!
//! Every failure is caught at the operation boundary and rendered as a
//! human-readable message; nothing here is retried automatically.

use miette::Diagnostic;
use thiserror::Error;

/// Broad category of a [`TrackerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-side pre-flight failure; never reached the network
    Validation,
    /// 401/403, including the suspended-account case on login
    Auth,
    /// 404
    NotFound,
    /// 5xx or anything unclassified from the backend
    Server,
    /// Local state problems (no session, no report, storage)
    Local,
}

/// Errors produced by the tracker core
#[derive(Debug, Error, Diagnostic)]
pub enum TrackerError {
    #[error("{field}: {message}")]
    #[diagnostic(code(reqtrack::validation))]
    Validation { field: String, message: String },

    #[error("Access denied: {message}")]
    #[diagnostic(code(reqtrack::auth::denied))]
    AccessDenied { message: String },

    #[error("Account suspended")]
    #[diagnostic(
        code(reqtrack::auth::suspended),
        help("Your account has been suspended. Contact an administrator to reactivate it.")
    )]
    AccountSuspended,

    #[error("Login failed: {message}")]
    #[diagnostic(code(reqtrack::auth::credentials))]
    InvalidCredentials { message: String },

    #[error("Not found: {message}")]
    #[diagnostic(code(reqtrack::not_found))]
    NotFound { message: String },

    #[error("Server error{}: {message}", status_suffix(.status))]
    #[diagnostic(
        code(reqtrack::server),
        help("The request was not applied. Please try again.")
    )]
    Server { status: Option<u16>, message: String },

    #[error("A change for {entity} is already in progress")]
    #[diagnostic(code(reqtrack::in_progress))]
    OperationInProgress { entity: String },

    #[error("No report has been generated yet")]
    #[diagnostic(
        code(reqtrack::report::missing),
        help("Generate a report before exporting it")
    )]
    NoReport,

    #[error("Not logged in")]
    #[diagnostic(code(reqtrack::session::none), help("Run 'reqtrack login <fnumber>' first"))]
    NotLoggedIn,

    #[error("Export failed: {message}")]
    #[diagnostic(code(reqtrack::export))]
    Export { message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(reqtrack::io))]
    Storage(#[from] std::io::Error),

    #[error("Unexpected response: {0}")]
    #[diagnostic(code(reqtrack::decode))]
    Decode(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl TrackerError {
    /// Field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => TrackerError::AccessDenied { message },
            404 => TrackerError::NotFound { message },
            _ => TrackerError::Server {
                status: Some(status),
                message,
            },
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::Validation { .. } => ErrorKind::Validation,
            TrackerError::AccessDenied { .. }
            | TrackerError::AccountSuspended
            | TrackerError::InvalidCredentials { .. } => ErrorKind::Auth,
            TrackerError::NotFound { .. } => ErrorKind::NotFound,
            TrackerError::Server { .. } | TrackerError::Decode(_) => ErrorKind::Server,
            TrackerError::OperationInProgress { .. }
            | TrackerError::NoReport
            | TrackerError::NotLoggedIn
            | TrackerError::Export { .. }
            | TrackerError::Storage(_) => ErrorKind::Local,
        }
    }

    /// Field name for validation failures
    pub fn field(&self) -> Option<&str> {
        match self {
            TrackerError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            TrackerError::from_status(401, "expired"),
            TrackerError::AccessDenied { .. }
        ));
        assert!(matches!(
            TrackerError::from_status(403, "admins only"),
            TrackerError::AccessDenied { .. }
        ));
        assert!(matches!(
            TrackerError::from_status(404, "Project not found"),
            TrackerError::NotFound { .. }
        ));
        assert!(matches!(
            TrackerError::from_status(500, "boom"),
            TrackerError::Server { status: Some(500), .. }
        ));
        assert!(matches!(
            TrackerError::from_status(409, "conflict"),
            TrackerError::Server { status: Some(409), .. }
        ));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            TrackerError::validation("rejectionReason", "required").kind(),
            ErrorKind::Validation
        );
        assert_eq!(TrackerError::AccountSuspended.kind(), ErrorKind::Auth);
        assert_eq!(
            TrackerError::InvalidCredentials {
                message: "bad".into()
            }
            .kind(),
            ErrorKind::Auth
        );
        assert_eq!(TrackerError::NoReport.kind(), ErrorKind::Local);
    }

    #[test]
    fn test_suspended_is_distinct_from_bad_credentials() {
        let suspended = TrackerError::AccountSuspended.to_string();
        let bad = TrackerError::InvalidCredentials {
            message: "Invalid username or password".into(),
        }
        .to_string();
        assert_ne!(suspended, bad);
        assert!(suspended.contains("suspended"));
    }

    #[test]
    fn test_messages() {
        let err = TrackerError::validation("deletionReason", "Deletion reason is required");
        assert_eq!(err.to_string(), "deletionReason: Deletion reason is required");
        assert_eq!(err.field(), Some("deletionReason"));

        let err = TrackerError::Server {
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Server error: connection refused");

        let err = TrackerError::from_status(502, "bad gateway");
        assert_eq!(err.to_string(), "Server error (502): bad gateway");
    }
}
