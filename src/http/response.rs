//! HTTP response building module
//!
//! Every response the handler emits is JSON; the function host parses
//! error bodies the same way it parses invocation results.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::HttpConfig;

/// Error body for envelopes that fail to decode
pub const INVALID_PAYLOAD: &str = "Invalid request payload";

/// Build JSON response
pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    http_config: &HttpConfig,
) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(json) => build_json(status, Bytes::from(json), http_config, None),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(br#"{"error":"Internal server error"}"#),
                http_config,
                None,
            )
        }
    }
}

/// Build `{"error": message}` response
pub fn build_error_response(
    status: StatusCode,
    message: &str,
    http_config: &HttpConfig,
) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }), http_config)
}

/// Build 400 response for an undecodable invocation envelope
pub fn build_invalid_payload_response(http_config: &HttpConfig) -> Response<Full<Bytes>> {
    build_error_response(StatusCode::BAD_REQUEST, INVALID_PAYLOAD, http_config)
}

/// Build 404 Not Found response
pub fn build_404_response(http_config: &HttpConfig) -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "Not Found", http_config)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &'static str, http_config: &HttpConfig) -> Response<Full<Bytes>> {
    let body = Bytes::from_static(br#"{"error":"Method Not Allowed"}"#);
    build_json(StatusCode::METHOD_NOT_ALLOWED, body, http_config, Some(allow))
}

/// Build 413 Payload Too Large response
pub fn build_413_response(http_config: &HttpConfig) -> Response<Full<Bytes>> {
    build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large", http_config)
}

/// Build health check response
pub fn build_health_response(http_config: &HttpConfig) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({ "status": "ok" }),
        http_config,
    )
}

fn build_json(
    status: StatusCode,
    body: Bytes,
    http_config: &HttpConfig,
    allow: Option<&'static str>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Server", &http_config.server_name);

    if let Some(methods) = allow {
        builder = builder.header("Allow", methods);
    }

    builder.body(Full::new(body.clone())).unwrap_or_else(|e| {
        log_build_error(status, &e);
        let mut fallback = Response::new(Full::new(body));
        *fallback.status_mut() = status;
        fallback
    })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
