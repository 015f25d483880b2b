#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sha2::Sha256;
use url::Url;
use yatra_api::{app, metrics::Metrics, AppState};
use yatra_core::payment::{GatewayError, GatewayOrderRequest, PaymentGateway};
use yatra_core::PriceList;
use yatra_order::{OrderService, RetryPolicy, SignatureVerifier, VerificationService, WebhookProcessor};
use yatra_shared::pii::Masked;
use yatra_store::OrderStatusStore;

pub const WEBHOOK_SECRET: &str = "TEST_CLIENT_SECRET";
pub const GATEWAY_TIMEOUT: Duration = Duration::from_millis(300);

pub enum OnCreate {
    Succeed,
    Fail(GatewayError),
    Hang,
}

/// In-process stand-in for the Cashfree API.
pub struct StubGateway {
    on_create: OnCreate,
    payments: Mutex<Result<Value, GatewayError>>,
    pub create_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub last_order: Mutex<Option<Value>>,
}

impl StubGateway {
    pub fn new(on_create: OnCreate) -> Self {
        Self {
            on_create,
            payments: Mutex::new(Ok(json!([]))),
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            last_order: Mutex::new(None),
        }
    }

    pub fn with_payments(self, payments: Result<Value, GatewayError>) -> Self {
        *self.payments.lock().unwrap() = payments;
        self
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<Value, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_order.lock().unwrap() = Some(serde_json::to_value(request).unwrap());
        match &self.on_create {
            OnCreate::Succeed => Ok(json!({
                "cf_order_id": "2149460581",
                "order_id": request.order_id.as_str(),
                "order_amount": request.order_amount,
                "order_currency": request.order_currency,
                "order_status": "ACTIVE",
                "payment_session_id": "session_test_123"
            })),
            OnCreate::Fail(e) => Err(e.clone()),
            OnCreate::Hang => {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Err(GatewayError::Transport("unreachable".into()))
            }
        }
    }

    async fn fetch_payments(&self, _order_id: &str) -> Result<Value, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.payments.lock().unwrap().clone()
    }
}

pub fn test_app(gateway: Arc<StubGateway>) -> Router {
    let orders = OrderService::new(
        gateway.clone(),
        PriceList::default(),
        Url::parse("http://localhost:5173/ticket-success").unwrap(),
        Url::parse("http://localhost:5001/webhook").unwrap(),
        GATEWAY_TIMEOUT,
    );
    let verification = VerificationService::new(gateway, GATEWAY_TIMEOUT, RetryPolicy::none());
    let webhooks = WebhookProcessor::new(
        SignatureVerifier::new(Masked::from(WEBHOOK_SECRET), 300),
        Arc::new(OrderStatusStore::new()),
    );

    app(AppState {
        orders: Arc::new(orders),
        verification: Arc::new(verification),
        webhooks: Arc::new(webhooks),
        metrics: Arc::new(Metrics::new().unwrap()),
        qr_service: Url::parse("https://api.qrserver.com/v1/create-qr-code/").unwrap(),
    })
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn sign(timestamp: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(timestamp.as_bytes());
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

pub fn booking(ticket_count: u32, visitor_type: &str) -> Value {
    json!({
        "customer_name": "Asha Rao",
        "customer_phone": "9876543210",
        "customer_email": "asha@example.com",
        "ticketCount": ticket_count,
        "visitor_type": visitor_type,
        "visit_date": "2026-11-02",
        "place_name": "Taj Mahal"
    })
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
