use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{ErrorResponse, MortgageInput, MortgagePaymentResult};
use crate::mortgage;
use crate::rate_limiter::{RateLimitDecision, RateLimiter, SlidingWindowLimiter};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Per-client admission control for the quote endpoint.
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Builds state with the in-process sliding-window limiter sized from `config`.
    pub fn new(config: Config) -> Self {
        let rate_limiter = Arc::new(SlidingWindowLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window(),
            config.rate_limit_max_clients,
        ));
        Self::with_rate_limiter(config, rate_limiter)
    }

    pub fn with_rate_limiter(config: Config, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            config,
            rate_limiter,
        }
    }
}

/// Health check endpoint.
///
/// Returns the service status and version. Not rate limited.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "mortgage-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/mortgage
///
/// Computes the fixed monthly payment for a mortgage quote.
///
/// Checks run in order: rate limit, content type, body size, JSON decoding,
/// field validation, then the payment formula. Every response after the rate
/// limit check carries the `X-RateLimit-*` headers. Validation detail is only
/// logged outside production and never sent to the client.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `connect_info` - Peer address, used when no `X-Forwarded-For` header is present.
/// * `headers` - Request headers.
/// * `body` - Raw request body, read up to the configured limit.
///
/// # Returns
///
/// * `Response` - `{"payment": n}` on success, or a generic `{"error": ...}` body.
#[utoipa::path(
    post,
    path = "/api/mortgage",
    request_body = MortgageInput,
    responses(
        (status = 200, description = "Monthly payment", body = MortgagePaymentResult),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 413, description = "Payload too large", body = ErrorResponse),
        (status = 415, description = "Content-Type must be application/json", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn calculate_mortgage(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let key = client_key(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let decision = state.rate_limiter.check(&key).await;

    let mut response = match quote(&state, &decision, &headers, body).await {
        Ok(result) => {
            tracing::debug!("Computed monthly payment: {:.2}", result.payment);
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(err) => {
            log_rejection(&state.config, &err);
            err.into_response()
        }
    };

    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

async fn quote(
    state: &AppState,
    decision: &RateLimitDecision,
    headers: &HeaderMap,
    body: Body,
) -> Result<MortgagePaymentResult, AppError> {
    if !decision.allowed {
        return Err(AppError::RateLimited);
    }

    if !is_json_content_type(headers) {
        return Err(AppError::UnsupportedMediaType);
    }

    let max_body_bytes = state.config.max_body_bytes;
    if declared_length(headers).is_some_and(|len| len > max_body_bytes) {
        return Err(AppError::PayloadTooLarge);
    }

    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| {
            tracing::debug!("Failed to read request body: {}", e);
            AppError::PayloadTooLarge
        })?;

    let raw: Value = serde_json::from_slice(&bytes)?;
    let request = mortgage::validate(&raw)?;

    mortgage::compute_monthly_payment(&request).with_context(|| {
        format!(
            "computing payment for principal={} rate={} term={}",
            request.principal(),
            request.rate,
            request.term
        )
    })
}

/// Fallback for unsupported methods on `/api/mortgage`.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Builds the rate-limit key: client IP plus user agent.
///
/// The IP is the first `X-Forwarded-For` entry when present, otherwise the
/// socket peer address, otherwise `unknown`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    format!("{}|{}", ip, user_agent)
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(decision.reset_at_ms));
}

/// Logs client-side rejections. Input detail stays out of production logs.
fn log_rejection(config: &Config, err: &AppError) {
    match err {
        AppError::InvalidInput(e) if !config.is_production() => {
            tracing::warn!("Validation error: {}", e);
        }
        AppError::MalformedBody(msg) if !config.is_production() => {
            tracing::warn!("Malformed JSON body: {}", msg);
        }
        AppError::InvalidInput(_) | AppError::MalformedBody(_) => {
            tracing::info!("Rejected invalid mortgage input");
        }
        AppError::RateLimited => tracing::warn!("Rate limit exceeded"),
        AppError::UnsupportedMediaType | AppError::PayloadTooLarge => {
            tracing::info!("Rejected request: {}", err);
        }
        _ => {}
    }
}
