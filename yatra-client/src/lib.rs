//! HTTP client for the booking server, used as the checkout backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;
use yatra_core::booking::{BookingRequest, VisitorType};
use yatra_core::checkout::{CheckoutBackend, CheckoutError, CheckoutSession};
use yatra_core::pricing::Quote;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with status {status}: {message}")]
    Server { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// POST /payment
    pub async fn create_order(&self, booking: &BookingRequest) -> Result<Value, ClientError> {
        let response = self
            .client
            .post(self.base_url.join("payment")?)
            .json(booking)
            .send()
            .await?;
        read_json(response).await
    }

    /// POST /verify
    pub async fn verify_payment(&self, order_id: &str) -> Result<Value, ClientError> {
        let response = self
            .client
            .post(self.base_url.join("verify")?)
            .json(&json!({ "orderId": order_id }))
            .send()
            .await?;
        read_json(response).await
    }

    /// GET /quote
    pub async fn quote(&self, visitor_type: VisitorType, ticket_count: u32) -> Result<Quote, ClientError> {
        let response = self
            .client
            .get(self.base_url.join("quote")?)
            .query(&[
                ("visitor_type", visitor_type.as_str().to_string()),
                ("ticket_count", ticket_count.to_string()),
            ])
            .send()
            .await?;
        let body = read_json(response).await?;
        serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}

#[async_trait]
impl CheckoutBackend for ApiClient {
    async fn request_session(
        &self,
        booking: &BookingRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        let order = self
            .create_order(booking)
            .await
            .map_err(|e| CheckoutError::Session(e.to_string()))?;

        let field = |name: &str| {
            order
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| CheckoutError::Session(format!("response missing {}", name)))
        };
        let session = CheckoutSession {
            order_id: field("order_id")?,
            payment_session_id: field("payment_session_id")?,
        };
        debug!("Received checkout session for order {}", session.order_id);
        Ok(session)
    }

    async fn verify(&self, order_id: &str) -> Result<Value, CheckoutError> {
        self.verify_payment(order_id)
            .await
            .map_err(|e| CheckoutError::Verification(e.to_string()))
    }
}
