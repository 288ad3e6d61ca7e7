// API error module
// Every handler failure becomes a status code plus {"message": "..."}

use hyper::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;
use crate::http::{build_message_response, BodyError, HttpResponse};
use crate::store::StoreError;

const SERVER_ERROR: &str = "Server error.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("payload too large")]
    PayloadTooLarge,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Unexpected failure. `message` is what the client sees.
    #[error("{cause}")]
    Internal { message: &'static str, cause: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<BodyError> for ApiError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::TooLarge { .. } => Self::PayloadTooLarge,
            BodyError::Read(_) => Self::BadRequest("Invalid request body.".to_string()),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn invalid_json() -> Self {
        Self::BadRequest("Invalid JSON body.".to_string())
    }

    /// Replace the client-facing text of a 500, leaving other errors alone.
    #[must_use]
    pub fn or_server_message(self, message: &'static str) -> Self {
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            Self::Internal {
                message,
                cause: self.to_string(),
            }
        } else {
            self
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Store(StoreError::Duplicate { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Auth(AuthError::MissingToken | AuthError::InvalidToken(_)) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) | Self::Auth(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text sent to the client. Internal causes are never exposed.
    pub fn client_message(&self) -> String {
        match self {
            Self::BadRequest(m) | Self::Forbidden(m) | Self::NotFound(m) => m.clone(),
            Self::PayloadTooLarge => "Payload too large.".to_string(),
            Self::Store(StoreError::Duplicate { field }) if field == "email" => {
                "Email already in use.".to_string()
            }
            Self::Store(StoreError::Duplicate { field }) => format!("Duplicate {field}."),
            Self::Auth(AuthError::MissingToken) => "No token provided.".to_string(),
            Self::Auth(AuthError::InvalidToken(_)) => "Invalid token.".to_string(),
            Self::Store(_) | Self::Auth(_) => SERVER_ERROR.to_string(),
            Self::Internal { message, .. } => (*message).to_string(),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        build_message_response(self.status(), &self.client_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::invalid_json().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Hashing("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(StoreError::Duplicate { field: "email".into() }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(BodyError::TooLarge { limit: 10 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(
            ApiError::from(AuthError::InvalidToken("ExpiredSignature".into())).client_message(),
            "Invalid token."
        );
        assert_eq!(
            ApiError::from(StoreError::Duplicate { field: "email".into() }).client_message(),
            "Email already in use."
        );
        let err = ApiError::from(StoreError::Backend("connection refused".into()));
        assert_eq!(err.client_message(), "Server error.");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_or_server_message() {
        let err = ApiError::from(StoreError::Backend("disk full".into()))
            .or_server_message("Upload failed.");
        assert_eq!(err.client_message(), "Upload failed.");
        assert!(err.to_string().contains("disk full"));

        let err = ApiError::bad_request("No file uploaded.").or_server_message("Upload failed.");
        assert_eq!(err.client_message(), "No file uploaded.");
    }
}
