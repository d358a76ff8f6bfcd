//! The response for routes and resources that do not exist.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Route fallback for paths that match no route.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// A 404 response with the same JSON shape as other errors.
pub fn get_404_not_found_response() -> Response {
    let status = StatusCode::NOT_FOUND;

    (
        status,
        Json(json!({
            "statusCode": status.as_u16(),
            "message": "the requested resource could not be found",
            "error": status.canonical_reason().unwrap_or_default(),
        })),
    )
        .into_response()
}
