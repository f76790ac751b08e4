use std::convert::Infallible;

use log::error;
use serde::Serialize;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::catalog::CatalogError;
use crate::identity::{AuthError, Forbidden};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps every rejection to a status code and `{ "error": message }`.
pub async fn recover(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(e) = err.find::<AuthError>() {
        (StatusCode::UNAUTHORIZED, e.to_string())
    } else if err.find::<Forbidden>().is_some() {
        (StatusCode::FORBIDDEN, "forbidden".to_string())
    } else if let Some(e) = err.find::<CatalogError>() {
        match e {
            CatalogError::Invalid => (StatusCode::BAD_REQUEST, e.to_string()),
            CatalogError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
            CatalogError::Store(inner) => {
                error!("Catalog storage failure: {}", inner);
                (StatusCode::INTERNAL_SERVER_ERROR, "server error".to_string())
            }
        }
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "server error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}
