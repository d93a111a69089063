use std::sync::Arc;
use std::time::Duration;

use auth::TokenSigner;
use axum::body::Body;
use axum::http::HeaderName;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::MakeRequestUuid;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::request_id::SetRequestIdLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::cookies::RefreshCookie;
use super::handlers::health::health;
use super::handlers::logout::logout;
use super::handlers::logout_all::logout_all;
use super::handlers::refresh::refresh;
use super::handlers::sign_in::sign_in;
use super::handlers::sign_up::sign_up;
use super::middleware::authenticate as auth_middleware;
use crate::domain::credentials::ports::CredentialServicePort;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub credential_service: Arc<dyn CredentialServicePort>,
    pub token_signer: Arc<TokenSigner>,
    pub refresh_cookie: Arc<RefreshCookie>,
}

pub fn create_router(
    credential_service: Arc<dyn CredentialServicePort>,
    token_signer: Arc<TokenSigner>,
    refresh_cookie: RefreshCookie,
) -> Router {
    let state = AppState {
        credential_service,
        token_signer,
        refresh_cookie: Arc::new(refresh_cookie),
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout));

    let protected_routes = Router::new()
        .route("/api/auth/logout-all", delete(logout_all))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    request_id_header.clone(),
                    MakeRequestUuid,
                ))
                .layer(trace_layer)
                .layer(PropagateRequestIdLayer::new(request_id_header)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
