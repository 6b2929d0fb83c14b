//! API route definitions
//!
//! Dashboard endpoints:
//! - /api/v1/status, /risk, /alerts, /toasts - live monitoring state
//! - /api/v1/readings, /readings/export.csv - chart data and CSV export
//! - /api/v1/refresh - out-of-band poll
//! - /api/v1/containers, /users, /stats - admin console

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers::{self, DashboardState};

/// Create all API routes for the dashboard
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/status", get(handlers::get_status))
        .route("/risk", get(handlers::get_risk))
        .route("/alerts", get(handlers::get_alerts))
        .route("/toasts", get(handlers::get_toasts).delete(handlers::clear_toasts))
        .route("/readings/export.csv", get(handlers::export_readings_csv))
        .route("/readings", get(handlers::get_readings))
        .route("/refresh", post(handlers::request_refresh))
        .route("/config", get(handlers::get_config))
        // Admin console
        .route(
            "/containers",
            get(handlers::list_containers).post(handlers::create_container),
        )
        .route("/containers/:key", delete(handlers::delete_container))
        .route("/containers/:key/status", patch(handlers::update_container_status))
        .route("/stats", get(handlers::get_stats))
        .route("/users", get(handlers::list_users))
        .route("/users/:email", delete(handlers::delete_user))
        .route("/users/:email/reset-password", post(handlers::reset_password))
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
