//! Request-level errors and their HTTP mapping.
//!
//! Every failure a handler can produce is a variant here; the `Display`
//! text is exactly what the client receives as a plain-text body. The
//! filesystem-layer errors convert into these at the handler boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::files::{BrowserError, OpsError};

/// Errors returned to HTTP clients.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request path escapes the served root or is malformed.
    #[error("Invalid path.")]
    InvalidPath,

    /// The resolved path does not exist on disk.
    #[error("File or directory does not exist.")]
    NotFound,

    /// The process may not read the resolved path.
    #[error("You have no permission to access this path.")]
    NotReadable,

    /// The operation exists but is switched off for this server.
    #[error("{0} is disabled.")]
    Disabled(&'static str),

    /// A mutation targeted something that is not a directory.
    #[error("Target is not a directory.")]
    NotADirectory,

    /// An upload request carried no file part.
    #[error("File is not provided.")]
    MissingFile,

    /// The uploaded file name sanitized down to nothing.
    #[error("File name is not acceptable.")]
    InvalidFileName,

    /// A deletion target failed path validation.
    #[error("Path is invalid: {0}")]
    InvalidEntry(String),

    /// The parent directory of a deletion target is not writable.
    #[error("You have no permission to modify the parent directory of {0:?}")]
    ParentNotWritable(String),

    /// A deletion target itself is not writable.
    #[error("You have no permission to delete {0:?}")]
    NotDeletable(String),

    /// A new-folder request carried no name.
    #[error("Folder name is not provided.")]
    MissingName,

    /// The new-folder target already exists.
    #[error("Target already exists.")]
    AlreadyExists,

    /// The process may not write into the upload target directory.
    #[error("You have no permission to upload to this path.")]
    UploadForbidden,

    /// The POST body named an action this server does not know.
    #[error("Unknown action.")]
    UnknownAction,

    /// The request body could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// Unexpected I/O failure; details are logged, not sent.
    #[error("Internal server error.")]
    Internal(#[from] std::io::Error),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::InvalidPath
            | HttpError::MissingFile
            | HttpError::InvalidFileName
            | HttpError::InvalidEntry(_)
            | HttpError::MissingName
            | HttpError::AlreadyExists
            | HttpError::UnknownAction
            | HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::NotReadable
            | HttpError::Disabled(_)
            | HttpError::NotADirectory
            | HttpError::ParentNotWritable(_)
            | HttpError::NotDeletable(_)
            | HttpError::UploadForbidden => StatusCode::FORBIDDEN,
            HttpError::NotFound => StatusCode::NOT_FOUND,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if let HttpError::Internal(e) = &self {
            tracing::error!(error = %e, "request failed with internal error");
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<BrowserError> for HttpError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::PathOutsideRoot(_) => HttpError::InvalidPath,
            BrowserError::NotFound(_) => HttpError::NotFound,
            BrowserError::NotADirectory(_) => HttpError::NotADirectory,
            BrowserError::PermissionDenied(_) => HttpError::NotReadable,
            BrowserError::Io(e) => HttpError::Internal(e),
        }
    }
}

impl From<OpsError> for HttpError {
    fn from(e: OpsError) -> Self {
        match e {
            OpsError::NotADirectory(_) => HttpError::NotADirectory,
            OpsError::PermissionDenied(_) => HttpError::UploadForbidden,
            OpsError::AlreadyExists(_) => HttpError::AlreadyExists,
            OpsError::Io(e) => HttpError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_codes() {
        assert_eq!(HttpError::InvalidPath.status(), StatusCode::BAD_REQUEST);
        assert_eq!(HttpError::UnknownAction.status(), StatusCode::BAD_REQUEST);
        assert_eq!(HttpError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(HttpError::NotReadable.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            HttpError::Disabled("Upload").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            HttpError::Internal(std::io::Error::other("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(HttpError::InvalidPath.to_string(), "Invalid path.");
        assert_eq!(
            HttpError::NotFound.to_string(),
            "File or directory does not exist."
        );
        assert_eq!(
            HttpError::Disabled("Deletion").to_string(),
            "Deletion is disabled."
        );
        assert_eq!(
            HttpError::InvalidEntry("../x".to_string()).to_string(),
            "Path is invalid: ../x"
        );
        assert_eq!(
            HttpError::NotDeletable("a.txt".to_string()).to_string(),
            "You have no permission to delete \"a.txt\""
        );
        assert_eq!(
            HttpError::Internal(std::io::Error::other("boom")).to_string(),
            "Internal server error."
        );
    }

    #[test]
    fn test_from_browser_error() {
        let err: HttpError = BrowserError::PathOutsideRoot(PathBuf::from("../x")).into();
        assert!(matches!(err, HttpError::InvalidPath));

        let err: HttpError = BrowserError::NotFound(PathBuf::from("/x")).into();
        assert!(matches!(err, HttpError::NotFound));

        let err: HttpError = BrowserError::PermissionDenied(PathBuf::from("/x")).into();
        assert!(matches!(err, HttpError::NotReadable));
    }

    #[test]
    fn test_from_ops_error() {
        let err: HttpError = OpsError::NotADirectory(PathBuf::from("/x")).into();
        assert!(matches!(err, HttpError::NotADirectory));

        let err: HttpError = OpsError::PermissionDenied(PathBuf::from("/x")).into();
        assert!(matches!(err, HttpError::UploadForbidden));

        let err: HttpError = OpsError::AlreadyExists(PathBuf::from("/x")).into();
        assert!(matches!(err, HttpError::AlreadyExists));
    }
}
