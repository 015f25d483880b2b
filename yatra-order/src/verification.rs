use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::{info, instrument, warn};
use yatra_core::payment::{self, GatewayError, PaymentGateway};
use yatra_core::{CoreError, CoreResult};
use yatra_store::app_config::GatewayConfig;

/// Backoff for transient gateway failures on reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            initial_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            retries: config.verify_retries,
            initial_delay: config.retry_delay(),
        }
    }

    /// Wait before retry number `attempt` (1-based): doubles each time and
    /// saturates instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

/// Read-only proxy to the gateway's payment records.
///
/// Does not check that the order id was issued here; any id the gateway
/// knows can be verified. Safe to call repeatedly and concurrently.
pub struct VerificationService {
    gateway: Arc<dyn PaymentGateway>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl VerificationService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            timeout,
            retry,
        }
    }

    pub fn from_config(gateway: Arc<dyn PaymentGateway>, config: &GatewayConfig) -> Self {
        Self::new(gateway, config.timeout(), RetryPolicy::from_config(config))
    }

    /// Gateway payment records for `order_id`, unmodified.
    #[instrument(skip(self))]
    pub async fn verify_payment(&self, order_id: &str) -> CoreResult<Value> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(CoreError::ValidationError("orderId is required".to_string()));
        }

        let mut attempt = 0;
        loop {
            match self.fetch_once(order_id).await {
                Ok(payments) => {
                    info!("Fetched payments for order {}", order_id);
                    return Ok(payments);
                }
                Err(e) if e.is_transient() && attempt < self.retry.retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Verification of {} failed ({}), retry {}/{} in {:?}",
                        order_id, e, attempt, self.retry.retries, delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(CoreError::VerificationFailed(e)),
            }
        }
    }

    /// Whether the gateway holds a settled payment for the order.
    pub async fn is_paid(&self, order_id: &str) -> CoreResult<bool> {
        Ok(payment::is_paid(&self.verify_payment(order_id).await?))
    }

    async fn fetch_once(&self, order_id: &str) -> Result<Value, GatewayError> {
        match timeout(self.timeout, self.gateway.fetch_payments(order_id)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        }
    }
}
