use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use yatra_core::payment::{GatewayError, GatewayOrderRequest, PaymentGateway};
use yatra_shared::pii::Masked;

use crate::app_config::GatewayConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cashfree PG REST client.
#[derive(Clone)]
pub struct CashfreeGateway {
    client: reqwest::Client,
    base_url: Url,
    client_id: String,
    client_secret: Masked<String>,
    api_version: String,
    timeout: Duration,
}

impl CashfreeGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let base_url = Url::parse(config.base_url())
            .map_err(|e| GatewayError::Transport(format!("invalid gateway base url: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_version: config.api_version.clone(),
            timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport("gateway base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", self.client_secret.expose())
            .header("x-api-version", &self.api_version)
            .header(ACCEPT, "application/json")
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Transport(err.to_string())
        }
    }

    async fn read_json(&self, response: Response) -> Result<Value, GatewayError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            // Error bodies look like {"message": "...", "code": "...", "type": "..."}.
            let message = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            warn!("Cashfree responded {}: {}", status.as_u16(), message);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for CashfreeGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<Value, GatewayError> {
        let url = self.endpoint(&["orders"])?;
        debug!("Creating Cashfree order {} for {} {}", request.order_id, request.order_amount, request.order_currency);

        let response = self
            .authorized(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_json(response).await
    }

    async fn fetch_payments(&self, order_id: &str) -> Result<Value, GatewayError> {
        let url = self.endpoint(&["orders", order_id, "payments"])?;
        debug!("Fetching Cashfree payments for order {}", order_id);

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_json(response).await
    }
}
