use axum::{
    extract::State,
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod metrics;
pub mod payments;
pub mod state;
pub mod tickets;
pub mod webhooks;

pub use state::AppState;

use error::AppError;

pub fn app(state: AppState) -> Router {
    // Browser checkout page runs on a different origin.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::USER_AGENT]);

    Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics_handler))
        .merge(payments::routes())
        .merge(tickets::routes())
        .merge(webhooks::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
async fn root() -> &'static str {
    "Hello World"
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Result<String, AppError> {
    Ok(state.metrics.render()?)
}
