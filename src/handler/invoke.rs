//! Invocation endpoint
//!
//! Reads the envelope off the request body, runs the trigger, and
//! serializes the result envelope.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use std::error::Error as StdError;
use thiserror::Error;

use crate::config::{AppState, HttpConfig};
use crate::http;
use crate::invocation::InvocationRequest;
use crate::logger;

/// Failures while reading a request body
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Request body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Failed to read request body: {0}")]
    Read(String),
}

pub async fn handle_invocation<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let http_config = &state.config.http;

    if let Some(resp) = check_body_size(&req, http_config) {
        return resp;
    }

    let body = match read_body(req.into_body(), http_config.max_body_size).await {
        Ok(body) => body,
        Err(err @ BodyError::TooLarge { .. }) => {
            logger::log_error(&err.to_string());
            return http::build_413_response(http_config);
        }
        Err(err) => {
            logger::log_warning(&err.to_string());
            return http::build_invalid_payload_response(http_config);
        }
    };

    let request = match InvocationRequest::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            logger::log_warning(&format!("Rejected invocation: {err}"));
            return http::build_invalid_payload_response(http_config);
        }
    };

    let response = state.trigger.invoke(&request).await;
    http::json_response(StatusCode::OK, &response, http_config)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, http_config: &HttpConfig) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > http_config.max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {})",
                    http_config.max_body_size
                ));
                Some(http::build_413_response(http_config))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', relying on streaming limit"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the body, enforcing the limit even without a Content-Length
async fn read_body<B>(body: B, limit: u64) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let max = usize::try_from(limit).unwrap_or(usize::MAX);
    match Limited::new(body, max).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(BodyError::TooLarge { limit })
        }
        Err(err) => Err(BodyError::Read(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = Full::new(Bytes::from_static(b"{\"Data\":{}}"));
        let bytes = read_body(body, 64).await.unwrap();
        assert_eq!(&bytes[..], b"{\"Data\":{}}");
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let body = Full::new(Bytes::from(vec![b'x'; 65]));
        assert!(matches!(
            read_body(body, 64).await,
            Err(BodyError::TooLarge { limit: 64 })
        ));
    }
}
