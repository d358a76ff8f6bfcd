//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::endpoints;

/// The number of characters of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";
const REDACTED_FIELDS: [&str; 1] = ["password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Passwords in JSON bodies, the `Authorization` header and issued tokens
/// are never logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    let is_log_in = parts.uri.path() == endpoints::LOG_IN;
    log_request(
        &parts.method,
        &parts.uri,
        &redact_headers(&parts.headers),
        &redact_json(&String::from_utf8_lossy(&bytes)),
    );

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    if is_log_in && parts.status.is_success() {
        log_response(parts.status, &parts.headers, REDACTED);
    } else {
        log_response(parts.status, &parts.headers, &String::from_utf8_lossy(&bytes));
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// Buffer the whole body so it can be logged and then passed on unchanged.
async fn read_body(body: Body) -> Result<Bytes, Response> {
    to_bytes(body, usize::MAX).await.map_err(|error| {
        tracing::error!("Could not read body for logging: {error}");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    headers
}

/// Replace the value of password fields in a JSON object body.
///
/// Bodies that are not JSON objects are returned unchanged.
fn redact_json(body_text: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    let mut redacted = false;
    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = Value::String(REDACTED.to_owned());
            redacted = true;
        }
    }

    if redacted {
        Value::Object(object).to_string()
    } else {
        body_text.to_owned()
    }
}

fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn log_request(method: &Method, uri: &Uri, headers: &HeaderMap, body: &str) {
    match truncate(body) {
        Some(prefix) => {
            tracing::info!("Received request: {method} {uri} {headers:?}\nbody: {prefix}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {method} {uri} {headers:?}\nbody: {body:?}"),
    }
}

fn log_response(status: StatusCode, headers: &HeaderMap, body: &str) {
    match truncate(body) {
        Some(prefix) => {
            tracing::info!("Sending response: {status} {headers:?}\nbody: {prefix}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {status} {headers:?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        body::Bytes,
        http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;
    use serde_json::Value;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_headers, redact_json, truncate};

    #[test]
    fn redacts_password_field() {
        let redacted = redact_json(r#"{"handle":"testuser123","password":"Test@1234567"}"#);

        assert!(!redacted.contains("Test@1234567"));
        assert!(redacted.contains("testuser123"));
    }

    #[test]
    fn leaves_other_bodies_unchanged() {
        assert_eq!(redact_json("not json"), "not json");
        assert_eq!(redact_json(r#"{"name":"food"}"#), r#"{"name":"food"}"#);
    }

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret.token"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted.get(AUTHORIZATION).unwrap(), "********");
    }

    #[test]
    fn truncates_on_character_boundary() {
        let body = "가".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        let prefix = truncate(&body).unwrap();

        assert_eq!(prefix.chars().count(), LOG_BODY_LENGTH_LIMIT);
        assert_eq!(truncate("short"), None);
    }

    #[tokio::test]
    async fn passes_body_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post("/echo")
            .text(r#"{"password":"Test@1234567"}"#)
            .await;

        response.assert_text(r#"{"password":"Test@1234567"}"#);
    }

    #[tokio::test]
    async fn invalid_utf8_body_reaches_handler_unchanged() {
        let app = Router::new()
            .route("/json", post(|Json(body): Json<Value>| async move { Json(body) }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post("/json")
            .content_type("application/json")
            .bytes(Bytes::from_static(b"{\"name\":\"fo\xffod\"}"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
