//! Error taxonomy shared by every transport.
//!
//! # Design
//! Handlers return [`Error`] instead of writing failure responses
//! themselves. Each variant carries a `message` that reaches the caller and
//! an `internal` diagnostic that only reaches the log. The set is closed:
//! translation matches it exhaustively, and failures from outside the
//! taxonomy enter it as `InternalServerError` through [`Error::other`] or
//! the `From` impls below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::Outbound;

/// A boxed error type for failures wrapped by `InternalServerError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by every handler.
pub type HandlerResult = Result<(), Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// 400.
    #[error("{message}")]
    BadRequest { message: String, internal: String },

    /// 401.
    #[error("{message}")]
    Unauthorized { message: String, internal: String },

    /// 404.
    #[error("{message}")]
    NotFound { message: String, internal: String },

    /// 405.
    #[error("{message}")]
    MethodNotAllowed { message: String, internal: String },

    /// 422, with an application-defined sub-code.
    #[error("{message}")]
    UnprocessableEntity {
        code: i64,
        message: String,
        internal: String,
    },

    /// 500.
    #[error("{message}")]
    InternalServerError {
        message: String,
        internal: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Wire form of an error. `code` is only present for 422 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<i64>,
    pub message: String,
}

impl Error {
    pub fn bad_request(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
            internal: internal.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Error::Unauthorized {
            message: message.into(),
            internal: internal.into(),
        }
    }

    pub fn not_found(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
            internal: internal.into(),
        }
    }

    pub fn method_not_allowed(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Error::MethodNotAllowed {
            message: message.into(),
            internal: internal.into(),
        }
    }

    pub fn unprocessable_entity(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        Error::UnprocessableEntity {
            code,
            internal: format!("unprocessable entity code: {code}, message: {message}"),
            message,
        }
    }

    pub fn internal(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Error::InternalServerError {
            message: message.into(),
            internal: internal.into(),
            source: None,
        }
    }

    /// Wrap a failure from outside the taxonomy.
    ///
    /// The failure's own text becomes both the caller-visible message and
    /// the diagnostic.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let text = err.to_string();
        Error::InternalServerError {
            message: text.clone(),
            internal: text,
            source: Some(Box::new(err)),
        }
    }

    /// HTTP status code this error is rendered with.
    pub fn status(&self) -> u16 {
        match self {
            Error::BadRequest { .. } => 400,
            Error::Unauthorized { .. } => 401,
            Error::NotFound { .. } => 404,
            Error::MethodNotAllowed { .. } => 405,
            Error::UnprocessableEntity { .. } => 422,
            Error::InternalServerError { .. } => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::BadRequest { message, .. }
            | Error::Unauthorized { message, .. }
            | Error::NotFound { message, .. }
            | Error::MethodNotAllowed { message, .. }
            | Error::UnprocessableEntity { message, .. }
            | Error::InternalServerError { message, .. } => message,
        }
    }

    /// Diagnostic text; never serialized.
    pub fn internal_message(&self) -> &str {
        match self {
            Error::BadRequest { internal, .. }
            | Error::Unauthorized { internal, .. }
            | Error::NotFound { internal, .. }
            | Error::MethodNotAllowed { internal, .. }
            | Error::UnprocessableEntity { internal, .. }
            | Error::InternalServerError { internal, .. } => internal,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let code = match self {
            Error::UnprocessableEntity { code, .. } => Some(*code),
            _ => None,
        };
        ErrorBody {
            code,
            message: self.message().to_string(),
        }
    }

    /// Rebuild an error from a rendered status and body.
    ///
    /// Returns `None` for statuses below 400. Unknown error statuses map to
    /// `InternalServerError`.
    pub fn from_status(status: u16, body: ErrorBody) -> Option<Self> {
        if status < 400 {
            return None;
        }
        let internal = format!("status {status}: {}", body.message);
        let err = match status {
            400 => Error::bad_request(body.message, internal),
            401 => Error::unauthorized(body.message, internal),
            404 => Error::not_found(body.message, internal),
            405 => Error::method_not_allowed(body.message, internal),
            422 => Error::UnprocessableEntity {
                code: body.code.unwrap_or_default(),
                message: body.message,
                internal,
            },
            _ => Error::internal(body.message, internal),
        };
        Some(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::other(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::other(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::other(err)
    }
}

/// Render `err` into `response` unless it is already committed.
pub fn render_error<R: Outbound>(response: &mut R, err: &Error) {
    if response.committed() {
        return;
    }
    tracing::error!(status = err.status(), internal = err.internal_message(), "{err}");
    response.set_status(err.status());
    if let Err(write_err) = response.write(&err.body()) {
        tracing::error!(error = %write_err, "failed to write error response");
    }
}
