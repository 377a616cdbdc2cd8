//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: access logging, method
//! validation, and dispatch to the invocation or health route.

use crate::config::AppState;
use crate::handler::invoke;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let started = Instant::now();
    logger::log_request(req.method(), req.uri(), req.version());

    let access_log = state.config.logging.access_log;
    let entry = access_log.then(|| new_access_entry(&req, peer_addr));

    let response = route_request(req, &state).await;

    if let Some(entry) = entry {
        let entry = complete_access_entry(entry, &response, started);
        logger::log_access(&entry, state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let http_config = &state.config.http;
    let path = req.uri().path();

    if path == state.trigger_route {
        if req.method() != Method::POST {
            logger::log_warning(&format!("Method not allowed on {path}: {}", req.method()));
            return http::build_405_response("POST", http_config);
        }
        return invoke::handle_invocation(req, state).await;
    }

    let health = &state.config.health;
    if health.enabled && path == health.path {
        return match *req.method() {
            Method::GET | Method::HEAD => http::build_health_response(http_config),
            _ => http::build_405_response("GET, HEAD", http_config),
        };
    }

    http::build_404_response(http_config)
}

fn new_access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

/// Fill in the response side of an access log entry
fn complete_access_entry(
    mut entry: AccessLogEntry,
    response: &Response<Full<Bytes>>,
    started: Instant,
) -> AccessLogEntry {
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}
