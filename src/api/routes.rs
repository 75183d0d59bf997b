//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{auth_middleware, logging_middleware, rate_limit_middleware};
use crate::utils::constants::MAX_CONCURRENT_REQUESTS;

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let finance = Router::new()
        .route("/budgets", get(handlers::get_budgets).post(handlers::create_budget))
        .route("/transactions", post(handlers::create_transaction))
        .route("/employees", get(handlers::get_employees).post(handlers::add_employee))
        .route("/payroll/generate", post(handlers::generate_payroll))
        .route("/payroll/history", get(handlers::get_payroll_history))
        .route("/report/summary", get(handlers::get_financial_summary))
        .route("/dashboard/summary", get(handlers::get_dashboard_stats));

    // Static segments win over `:table`, so these never reach the proxy
    let api = Router::new()
        .nest("/finance", finance)
        .route("/inventory/summary", get(handlers::get_inventory_summary))
        .route("/nutrition/search", get(handlers::search_nutrition))
        .route("/nutrition/foods/:id/label", get(handlers::get_nutrition_label))
        .route("/:table", get(handlers::list_rows).post(handlers::create_rows))
        .route(
            "/:table/:id",
            get(handlers::get_row)
                .put(handlers::update_row)
                .delete(handlers::delete_row),
        );

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .with_state(state.clone())
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
        .layer(GlobalConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
