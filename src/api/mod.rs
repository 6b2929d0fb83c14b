//! REST API module using Axum
//!
//! HTTP endpoints for the cold-chain dashboard and admin console. Every JSON
//! response uses the envelope in [`envelope`].

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::DashboardState;

use axum::http::{header, Method, Uri};
use axum::response::Response;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use envelope::ApiErrorResponse;

/// Admin forms and refresh triggers are small; anything larger is rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

async fn not_found(uri: Uri) -> Response {
    ApiErrorResponse::not_found(format!("No route for {}", uri.path()))
}

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `COLDCHAIN_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for a dashboard served from elsewhere (e.g. `http://localhost:5173`).
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match std::env::var("COLDCHAIN_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: DashboardState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::health_routes(state))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
}
