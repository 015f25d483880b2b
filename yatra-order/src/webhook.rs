//! Gateway payment webhooks.
//!
//! Cashfree signs each delivery with
//! `base64(HMAC-SHA256(secret, x-webhook-timestamp + raw_body))`. Verified
//! events update the in-memory [`OrderStatusStore`]; re-deliveries are
//! no-ops.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{info, warn};
use yatra_shared::pii::Masked;
use yatra_store::order_status::{OrderStatusStore, PaymentState, StatusUpdate};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

/// Upper bound on the accepted timestamp skew, whatever is configured.
pub const MAX_TOLERANCE_SECONDS: i64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing signature header")]
    MissingSignature,
    #[error("Missing timestamp header")]
    MissingTimestamp,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Timestamp outside tolerance window")]
    StaleTimestamp,
    #[error("Signature mismatch")]
    InvalidSignature,
    #[error("Malformed webhook payload: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Masked<String>,
    tolerance: chrono::Duration,
}

impl SignatureVerifier {
    pub fn new(secret: Masked<String>, tolerance_seconds: i64) -> Self {
        Self {
            secret,
            tolerance: chrono::Duration::seconds(tolerance_seconds.clamp(0, MAX_TOLERANCE_SECONDS)),
        }
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(timestamp.as_bytes());
        mac.update(body);
        Ok(mac)
    }

    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, WebhookError> {
        let mac = self.mac(timestamp, body)?;
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let signature = signature.ok_or(WebhookError::MissingSignature)?;
        let timestamp = timestamp.ok_or(WebhookError::MissingTimestamp)?;

        let sent_at = parse_timestamp(timestamp)?;
        if now - sent_at > self.tolerance || sent_at - now > self.tolerance {
            return Err(WebhookError::StaleTimestamp);
        }

        let expected = STANDARD
            .decode(signature.trim())
            .map_err(|_| WebhookError::InvalidSignature)?;

        // verify_slice compares in constant time.
        self.mac(timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| WebhookError::InvalidSignature)
    }
}

/// Timestamps arrive as epoch milliseconds; plain seconds are accepted too.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, WebhookError> {
    let value: i64 = raw.trim().parse().map_err(|_| WebhookError::InvalidTimestamp)?;
    let parsed = if value > 100_000_000_000 {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    };
    parsed.ok_or(WebhookError::InvalidTimestamp)
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub event_time: Option<String>,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub order: WebhookOrder,
    pub payment: Option<WebhookPayment>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookOrder {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayment {
    pub cf_payment_id: Option<Value>,
    pub payment_status: String,
}

impl WebhookPayment {
    fn payment_id(&self) -> Option<String> {
        match self.cf_payment_id.as_ref()? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Recorded {
        order_id: String,
        update: StatusUpdate,
    },
    /// Verified but carries nothing this service tracks.
    Skipped {
        order_id: String,
        reason: String,
    },
}

pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    store: Arc<OrderStatusStore>,
}

impl WebhookProcessor {
    pub fn new(verifier: SignatureVerifier, store: Arc<OrderStatusStore>) -> Self {
        Self { verifier, store }
    }

    pub fn store(&self) -> &Arc<OrderStatusStore> {
        &self.store
    }

    pub async fn handle(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome, WebhookError> {
        if let Err(e) = self.verifier.verify(signature, timestamp, body, Utc::now()) {
            warn!("Rejected webhook: {}", e);
            return Err(e);
        }

        let event: WebhookEvent =
            serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;
        let order_id = event.data.order.order_id;
        info!("Received {} webhook for order {}", event.event_type, order_id);

        let Some(payment) = event.data.payment else {
            return Ok(WebhookOutcome::Skipped {
                order_id,
                reason: "no payment in event".to_string(),
            });
        };

        let Some(state) = PaymentState::from_gateway(&payment.payment_status) else {
            return Ok(WebhookOutcome::Skipped {
                order_id,
                reason: format!("untracked payment status {}", payment.payment_status),
            });
        };

        let update = self
            .store
            .apply(&order_id, payment.payment_id().as_deref(), state)
            .await;

        Ok(WebhookOutcome::Recorded { order_id, update })
    }
}
