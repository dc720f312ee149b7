use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, body) = if let Some(failure) = err.find::<ApiFailure>() {
        (
            failure.code.status(),
            ApiResponse::<()>::err(failure.code.clone(), failure.message.clone()),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ApiResponse::<()>::err(ApiErrorCode::ValidationError, e.to_string()),
        )
    } else if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ApiResponse::<()>::err(ApiErrorCode::UnknownRoute, "No such route"),
        )
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ApiResponse::<()>::err(ApiErrorCode::UnknownRoute, "Method not allowed"),
        )
    } else if err.find::<reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            ApiResponse::<()>::err(ApiErrorCode::ValidationError, "Content-Length is required"),
        )
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiResponse::<()>::err(ApiErrorCode::ValidationError, "Body must be application/json"),
        )
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ApiResponse::<()>::err(ApiErrorCode::ValidationError, "Request body too large"),
        )
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiResponse::<()>::err(ApiErrorCode::InternalError, "Internal error"),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ApiErrorCode {
    #[error("Request is malformed")]
    ValidationError,
    #[error("Invalid access or refresh token")]
    InvalidCredentials,
    #[error("Credential store is unavailable")]
    StoreUnavailable,
    #[error("Internal error")]
    InternalError,
    #[error("Unknown route")]
    UnknownRoute,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::UnknownRoute => StatusCode::NOT_FOUND,
        }
    }
}

/// Rejection carried from a handler to `recover_error`.
#[derive(Debug)]
pub struct ApiFailure {
    pub code: ApiErrorCode,
    pub message: String,
}

impl reject::Reject for ApiFailure {}

impl ApiFailure {
    fn new(code: ApiErrorCode) -> Self {
        ApiFailure {
            code,
            message: code.to_string(),
        }
    }
}

impl From<RotationError> for ApiFailure {
    fn from(error: RotationError) -> Self {
        match error {
            RotationError::Validation(message) => ApiFailure {
                code: ApiErrorCode::ValidationError,
                message,
            },
            // Clients can't tell an unknown pair from a wrong refresh token.
            RotationError::NotFound | RotationError::Unauthorized | RotationError::Conflict => {
                ApiFailure::new(ApiErrorCode::InvalidCredentials)
            }
            RotationError::Store(e) => {
                warn!("Store error: {}", e);
                ApiFailure::new(ApiErrorCode::StoreUnavailable)
            }
            RotationError::InternalError(e) => {
                warn!("Internal error: {}", e);
                ApiFailure::new(ApiErrorCode::InternalError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_collapse_to_invalid_credentials() {
        for error in [
            RotationError::NotFound,
            RotationError::Unauthorized,
            RotationError::Conflict,
        ] {
            let failure = ApiFailure::from(error);
            assert_eq!(failure.code, ApiErrorCode::InvalidCredentials);
            assert_eq!(failure.code.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn validation_message_is_passed_through() {
        let failure = ApiFailure::from(RotationError::Validation("GUID can't be empty".into()));
        assert_eq!(failure.code, ApiErrorCode::ValidationError);
        assert_eq!(failure.message, "GUID can't be empty");
    }

    #[test]
    fn store_errors_are_not_leaked() {
        let failure = ApiFailure::from(RotationError::Store("mysql://secret@db timed out".into()));
        assert_eq!(failure.code.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!failure.message.contains("secret"));
    }
}
