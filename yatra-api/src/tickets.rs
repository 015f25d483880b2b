use axum::{
    extract::{Path, RawQuery, State},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::Serialize;
use yatra_core::ticket::TicketView;
use yatra_store::order_status::OrderStatusRecord;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(get_ticket))
        .route("/orders/{order_id}/status", get(get_order_status))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    #[serde(flatten)]
    pub ticket: TicketView,
    pub qr_code_url: String,
    pub payment_confirmed: bool,
}

/// GET /tickets?order_id=..&customer_name=..
/// Render the ticket from the checkout return URL. `payment_confirmed` comes
/// from the gateway, never from the query string.
pub async fn get_ticket(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<TicketResponse> {
    let ticket = TicketView::from_query(query.as_deref().unwrap_or(""), Local::now().date_naive());

    let payment_confirmed = match ticket.order_id.as_deref() {
        Some(order_id) => match state.verification.is_paid(order_id).await {
            Ok(paid) => {
                let outcome = if paid { "paid" } else { "unpaid" };
                state.metrics.verifications.with_label_values(&[outcome]).inc();
                paid
            }
            Err(e) => {
                state.metrics.verifications.with_label_values(&["error"]).inc();
                tracing::warn!("Could not confirm payment for ticket {}: {}", ticket.ticket_id, e);
                false
            }
        },
        None => false,
    };

    let qr_code_url = ticket.qr_code_url(&state.qr_service).into();
    Json(TicketResponse {
        ticket,
        qr_code_url,
        payment_confirmed,
    })
}

/// GET /orders/{order_id}/status
/// Latest payment state reported for the order by gateway webhooks.
pub async fn get_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderStatusRecord>, AppError> {
    state
        .webhooks
        .store()
        .get(&order_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("No payment status for order {}", order_id)))
}
