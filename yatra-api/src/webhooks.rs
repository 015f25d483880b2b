use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use yatra_order::webhook::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use yatra_order::WebhookOutcome;
use yatra_store::StatusUpdate;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_payment_webhook))
}

/// POST /webhook
/// Signed payment status callback from the gateway. The body is read raw
/// because the signature covers the exact bytes sent.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let outcome = match state
        .webhooks
        .handle(header(SIGNATURE_HEADER), header(TIMESTAMP_HEADER), &body)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            state.metrics.webhooks.with_label_values(&["rejected"]).inc();
            return Err(e.into());
        }
    };

    let (order_id, label) = match &outcome {
        WebhookOutcome::Recorded { order_id, update } => (
            order_id,
            match update {
                StatusUpdate::Applied => "applied",
                StatusUpdate::Duplicate => "duplicate",
                StatusUpdate::Ignored => "ignored",
            },
        ),
        WebhookOutcome::Skipped { order_id, reason } => {
            tracing::debug!("Skipped webhook for order {}: {}", order_id, reason);
            (order_id, "skipped")
        }
    };
    state.metrics.webhooks.with_label_values(&[label]).inc();
    tracing::info!("Webhook for order {} {}", order_id, label);

    Ok(Json(json!({ "status": label })))
}
