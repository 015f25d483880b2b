use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use yatra_core::{BookingRequest, CoreError, Quote, VisitorType};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payment", post(create_payment))
        .route("/verify", post(verify_payment))
        .route("/quote", get(quote))
}

/// POST /payment
/// Create a gateway order for the booking and return the gateway's response,
/// which carries `order_id` and `payment_session_id`.
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(booking) = payload?;

    match state.orders.create_order(&booking).await {
        Ok(order) => {
            state.metrics.orders_created.inc();
            Ok(Json(order.gateway_order))
        }
        Err(e) => {
            state
                .metrics
                .order_failures
                .with_label_values(&[failure_reason(&e)])
                .inc();
            Err(e.into())
        }
    }
}

fn failure_reason(err: &CoreError) -> &'static str {
    match err {
        CoreError::ValidationError(_) => "validation",
        CoreError::PaymentCreationFailed(e) if e.is_timeout() => "timeout",
        CoreError::PaymentCreationFailed(_) => "gateway",
        CoreError::VerificationFailed(_) => "gateway",
        CoreError::RandomSourceUnavailable(_) => "random_source",
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "orderId", default)]
    pub order_id: String,
}

/// POST /verify
/// Fetch the payment attempts recorded by the gateway for an order.
pub async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;

    let result = state.verification.verify_payment(&request.order_id).await;
    let outcome = match &result {
        Ok(payments) if yatra_core::payment::is_paid(payments) => "paid",
        Ok(_) => "unpaid",
        Err(CoreError::ValidationError(_)) => "invalid",
        Err(_) => "error",
    };
    state.metrics.verifications.with_label_values(&[outcome]).inc();

    Ok(Json(result?))
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub visitor_type: String,
    pub ticket_count: u32,
}

/// GET /quote?visitor_type=Indian&ticket_count=2
pub async fn quote(
    State(state): State<AppState>,
    params: Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<Quote>, AppError> {
    let Query(params) = params?;
    let visitor_type: VisitorType = params.visitor_type.parse()?;
    Ok(Json(state.orders.quote(visitor_type, params.ticket_count)?))
}
