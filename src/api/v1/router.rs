use super::handler;
use crate::application_port::RotationService;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    rotation_service: Arc<dyn RotationService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // Paths before methods, so an unknown path stays a 404.
    let create = warp::path("create")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<handler::CreateRequest>())
        .and(with(rotation_service.clone()))
        .and_then(handler::create_pair);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<handler::RefreshRequest>())
        .and(with(rotation_service.clone()))
        .and_then(handler::refresh);

    let remove = warp::path("remove")
        .and(warp::path::end())
        .and(warp::delete())
        .and(json_body::<handler::RemoveRequest>())
        .and(with(rotation_service.clone()))
        .and_then(handler::remove);

    let remove_all = warp::path("remove")
        .and(warp::path("all"))
        .and(warp::path::end())
        .and(warp::delete())
        .and(json_body::<handler::RemoveAllRequest>())
        .and(with(rotation_service))
        .and_then(handler::remove_all);

    create.or(refresh).or(remove).or(remove_all)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
