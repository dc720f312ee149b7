use super::error::*;
use crate::application_port::RotationService;
use crate::domain_model::CredentialPair;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub guid: String,
}

pub async fn create_pair(
    body: CreateRequest,
    rotation_service: Arc<dyn RotationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = rotation_service
        .create_pair(&body.guid)
        .await
        .map_err(ApiFailure::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(pair.without_user())))
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    rotation_service: Arc<dyn RotationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let presented = CredentialPair::presented(body.access_token, body.refresh_token);
    let pair = rotation_service
        .refresh(&presented)
        .await
        .map_err(ApiFailure::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(pair.without_user())))
}

#[derive(Deserialize)]
pub struct RemoveRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
struct RemoveResponse {
    removed: bool,
}

pub async fn remove(
    body: RemoveRequest,
    rotation_service: Arc<dyn RotationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let removed = rotation_service
        .remove_by_refresh_credential(&body.refresh_token)
        .await
        .map_err(ApiFailure::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(RemoveResponse { removed })))
}

#[derive(Debug, Deserialize)]
pub struct RemoveAllRequest {
    pub guid: String,
}

#[derive(Debug, Serialize)]
struct RemoveAllResponse {
    removed: u64,
}

pub async fn remove_all(
    body: RemoveAllRequest,
    rotation_service: Arc<dyn RotationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let removed = rotation_service
        .remove_all_for_user(&body.guid)
        .await
        .map_err(ApiFailure::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(RemoveAllResponse { removed })))
}
