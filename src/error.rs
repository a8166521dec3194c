use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, warn};
use rusqlite::ErrorCode;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a request can end in. Each variant maps to exactly one
/// status code; the payload is the message shown to the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Duplicate registration or membership. Reported as a 400, like any
    /// other bad request.
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns a unique constraint failure into a [`Error::Conflict`] carrying
    /// `message`. Any other database error stays internal.
    pub fn on_constraint(err: rusqlite::Error, message: &str) -> Error {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => {
                debug!("Constraint violation: {}", err);
                Error::Conflict(message.to_owned())
            }
            _ => err.into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Internal(format!("database error: {}", err))
    }
}

impl From<snowcloud::Error> for Error {
    fn from(err: snowcloud::Error) -> Self {
        Error::Internal(format!("failed to generate snowflake: {}", err))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Error::Internal(details) => {
                error!("Server error: {}", details);
                ErrorBody {
                    message: "Internal server error".to_owned(),
                    details: Some(details),
                }
            }
            other => {
                warn!("Client error ({}): {}", status.as_u16(), other);
                ErrorBody {
                    message: other.to_string(),
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_are_bad_requests() {
        assert_eq!(
            Error::Conflict("Already in queue".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Forbidden("Admin access only".into()).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v INTEGER UNIQUE)", ()).unwrap();
        conn.execute("INSERT INTO t (v) VALUES (1)", ()).unwrap();
        let err = conn.execute("INSERT INTO t (v) VALUES (1)", ()).unwrap_err();

        match Error::on_constraint(err, "taken") {
            Error::Conflict(message) => assert_eq!(message, "taken"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }
}
