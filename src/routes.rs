use axum::{
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    BoxError, Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::Config;
use crate::errors::AppError;
use crate::handlers::{self, AppState};
use crate::models::{ErrorResponse, MortgageInput, MortgagePaymentResult};

/// OpenAPI description of the public endpoints.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mortgage API",
        description = "Fixed-rate mortgage monthly payment calculator"
    ),
    paths(handlers::calculate_mortgage, handlers::health),
    components(schemas(MortgageInput, MortgagePaymentResult, ErrorResponse))
)]
pub struct ApiDoc;

/// Builds the full application router.
///
/// `/api/mortgage` is the only rate-limited route; it also gets
/// `Cache-Control: no-store` and the CORS policy. The calculator page,
/// health check and API docs are served alongside it.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/mortgage",
            post(handlers::calculate_mortgage).fallback(handlers::method_not_allowed),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ))
                .layer(middleware::from_fn(options_no_content))
                .layer(cors_layer(&state.config)),
        );

    let timeout = state.config.request_timeout();

    let app = Router::new()
        .route("/", get(serve_calculator_page))
        .route("/health", get(handlers::health))
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.json", get(serve_openapi_spec))
        .merge(api_routes)
        .with_state(state);

    with_fault_handling(app, timeout).layer(TraceLayer::new_for_http())
}

/// Wraps `router` so that timeouts and handler panics still answer with the
/// generic `{"error": "Internal server error"}` body instead of an empty
/// response or a dropped connection.
pub fn with_fault_handling(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(timeout))
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::InternalError("request timed out".to_string())
    } else {
        AppError::InternalError(format!("unhandled middleware error: {}", err))
    }
}

/// Turns a handler panic into a 500 response.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = err.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = err.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::InternalError(format!("handler panicked: {}", detail)).into_response()
}

/// CORS policy: only the configured UI origin may call the API cross-origin.
///
/// The origin is echoed back only when the request `Origin` matches it.
fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match config
        .ui_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => layer.allow_origin(AllowOrigin::list([origin])),
        None => layer,
    }
}

/// The CORS layer answers every `OPTIONS` request itself with 200; the API
/// contract is 204 with no body.
async fn options_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status().is_success() {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Serves the OpenAPI document generated from the handler annotations.
async fn serve_openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// Loads the document served by `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Mortgage API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Serves the calculator form.
///
/// The form posts the four fields to `/api/mortgage` and shows the payment to
/// two decimals. Any failure clears the result instead of showing details.
async fn serve_calculator_page() -> Html<&'static str> {
    Html(CALCULATOR_PAGE)
}

const CALCULATOR_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Mortgage Calculator</title>
    <style>
        body { font-family: system-ui, sans-serif; display: flex; justify-content: center; }
        .container { max-width: 420px; width: 100%; padding: 2rem; }
        label { display: block; margin-bottom: 1rem; }
        input { display: block; width: 100%; padding: 0.4rem; margin-top: 0.25rem; }
        .error-text { color: #b00020; margin: 0.25rem 0 0; font-size: 0.9rem; }
        .margin-top { margin-top: 1.5rem; }
    </style>
</head>
<body>
<div class="container">
    <h1>Mortgage Calculator</h1>
    <form id="mortgage-form" novalidate>
        <label>Loan Amount ($):
            <input name="loanAmount" type="number" step="0.01" min="0" inputmode="decimal" required>
        </label>
        <label>Down Payment ($):
            <input name="downPayment" type="number" step="0.01" min="0" inputmode="decimal">
        </label>
        <label>Interest Rate (% per year):
            <input name="rate" type="number" step="0.001" min="0" max="100" inputmode="decimal" required>
        </label>
        <label>Term (Years):
            <input name="term" type="number" step="1" min="1" max="50" inputmode="numeric" required>
        </label>
        <p id="form-error" class="error-text" hidden></p>
        <button type="submit">Calculate</button>
    </form>
    <div id="result" class="margin-top" hidden>
        <h2>Result:</h2>
        <p>Your estimated monthly payment is <strong id="payment"></strong></p>
    </div>
</div>
<script>
    const form = document.getElementById('mortgage-form');
    const result = document.getElementById('result');
    const paymentEl = document.getElementById('payment');
    const formError = document.getElementById('form-error');

    form.addEventListener('submit', async (event) => {
        event.preventDefault();
        result.hidden = true;
        formError.hidden = true;

        const data = Object.fromEntries(new FormData(form).entries());
        try {
            const response = await fetch('/api/mortgage', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(data),
            });
            if (!response.ok) {
                formError.textContent = response.status === 429
                    ? 'Too many requests, please try again later.'
                    : 'Please check the values and try again.';
                formError.hidden = false;
                return;
            }
            const body = await response.json();
            if (typeof body.payment === 'number' && !Number.isNaN(body.payment)) {
                paymentEl.textContent = '$' + body.payment.toFixed(2);
                result.hidden = false;
            }
        } catch (err) {
            formError.textContent = 'Could not reach the server.';
            formError.hidden = false;
        }
    });
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_quote_endpoint() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        assert!(doc["paths"]["/api/mortgage"]["post"].is_object());
        assert!(doc["components"]["schemas"]["MortgagePaymentResult"].is_object());
    }

    #[test]
    fn test_calculator_page_posts_to_api() {
        assert!(CALCULATOR_PAGE.contains("fetch('/api/mortgage'"));
        for field in ["loanAmount", "downPayment", "rate", "term"] {
            assert!(CALCULATOR_PAGE.contains(&format!("name=\"{}\"", field)));
        }
    }

    #[test]
    fn test_rate_input_accepts_three_decimals() {
        assert!(CALCULATOR_PAGE.contains(r#"name="rate" type="number" step="0.001""#));
    }

    #[tokio::test]
    async fn test_panic_payload_becomes_generic_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_internal_error() {
        let err = handle_middleware_error(Box::new(Elapsed::new())).await;
        assert_eq!(
            err.status_and_message().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
