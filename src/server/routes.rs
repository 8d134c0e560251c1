use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::auth::auth_middleware;
use super::handlers::*;
use super::rate_limit::rate_limit_middleware;

pub fn create_router(state: AppState) -> Router {
    // Everything except health checks and credential exchange needs a token
    let protected = Router::new()
        .route("/api/v1/texts", post(create_text).get(list_texts))
        .route(
            "/api/v1/texts/{id}",
            get(get_text).patch(update_text).delete(delete_text),
        )
        .route("/api/v1/texts/{stat}/{id}", get(get_statistic))
        .route("/api/v1/analyze", post(analyze_text))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = cors_layer(state.config.client_url.as_deref());

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Auth routes
        .route("/api/v1/auth/register", post(register_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .merge(protected)
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state);

    with_security_headers(router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Hardening headers set on every response that does not carry them already
const SECURITY_HEADERS: [(HeaderName, &str); 8] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::X_DNS_PREFETCH_CONTROL, "off"),
    (
        header::STRICT_TRANSPORT_SECURITY,
        "max-age=31536000; includeSubDomains",
    ),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'self'; frame-ancestors 'self'; object-src 'none'",
    ),
    (
        HeaderName::from_static("cross-origin-opener-policy"),
        "same-origin",
    ),
    (
        HeaderName::from_static("cross-origin-resource-policy"),
        "same-origin",
    ),
];

fn with_security_headers(router: Router) -> Router {
    SECURITY_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ))
        })
}

/// Credentialed CORS for a configured client origin, permissive otherwise
fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let origin = client_url.and_then(|url| match url.parse::<HeaderValue>() {
        Ok(origin) => Some(origin),
        Err(_) => {
            tracing::warn!(client_url = url, "Ignoring invalid CLIENT_URL");
            None
        }
    });

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}
