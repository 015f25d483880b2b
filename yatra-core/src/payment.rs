use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use yatra_shared::pii::Masked;

use crate::booking::BookingRequest;
use crate::order_id::OrderId;
use crate::pricing::Quote;

/// Order-creation body as the gateway expects it.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderRequest {
    pub order_amount: u64,
    pub order_currency: String,
    pub order_id: OrderId,
    pub customer_details: CustomerDetails,
    pub order_meta: OrderMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_phone: Masked<String>,
    pub customer_name: String,
    pub customer_email: Masked<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderMeta {
    pub return_url: String,
    pub notify_url: String,
}

impl GatewayOrderRequest {
    pub fn new(
        order_id: OrderId,
        quote: &Quote,
        booking: &BookingRequest,
        order_meta: OrderMeta,
    ) -> Self {
        Self {
            order_amount: quote.amount,
            order_currency: quote.currency.clone(),
            order_id,
            customer_details: CustomerDetails {
                customer_id: booking.customer_id(),
                customer_phone: booking.customer_phone.clone(),
                customer_name: booking.customer_name.trim().to_string(),
                customer_email: booking.customer_email.clone(),
            },
            order_meta,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request timed out after {0:?}")]
    Timeout(Duration),
    #[error("gateway transport error: {0}")]
    Transport(String),
    #[error("gateway responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Failures worth retrying on a read. Client errors and bad bodies will
    /// not change on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Timeout(_) | GatewayError::Transport(_) => true,
            GatewayError::Status { status, .. } => *status >= 500,
            GatewayError::Decode(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}

/// The hosted payment gateway. Bodies are passed through as raw JSON; this
/// system does not model the gateway's settlement records.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order and hosted checkout session.
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<Value, GatewayError>;

    /// Fetch the payments recorded against an order.
    async fn fetch_payments(&self, order_id: &str) -> Result<Value, GatewayError>;
}

/// Pulls the hosted checkout token out of an order-creation response.
pub fn payment_session_id(order: &Value) -> Result<String, GatewayError> {
    order
        .get("payment_session_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Decode("missing payment_session_id".to_string()))
}

/// True when the gateway reports a settled payment.
///
/// Accepts the payment list returned by the fetch endpoint as well as a
/// single payment object carrying `payment_status` or `status`.
pub fn is_paid(payments: &Value) -> bool {
    fn settled(payment: &Value) -> bool {
        ["payment_status", "status"].iter().any(|key| {
            payment
                .get(*key)
                .and_then(Value::as_str)
                .is_some_and(|status| status.eq_ignore_ascii_case("SUCCESS"))
        })
    }

    match payments {
        Value::Array(list) => list.iter().any(settled),
        Value::Object(_) => settled(payments),
        _ => false,
    }
}
