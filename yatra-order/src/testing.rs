use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use yatra_core::booking::{BookingRequest, VisitorType};
use yatra_core::payment::{GatewayError, GatewayOrderRequest, PaymentGateway};
use yatra_shared::pii::Masked;

pub fn booking(ticket_count: u32, visitor_type: VisitorType) -> BookingRequest {
    BookingRequest {
        customer_name: "Asha Rao".to_string(),
        customer_phone: Masked::from("9876543210"),
        customer_email: Masked::from("asha@example.com"),
        ticket_count,
        visitor_type,
        visit_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        place_name: Some("Taj Mahal".to_string()),
    }
}

enum CreateBehaviour {
    Order(Value),
    Fail(GatewayError),
    Hang(Duration),
}

/// Scriptable in-memory gateway.
pub struct FakeGateway {
    create: CreateBehaviour,
    fetch_script: Mutex<VecDeque<Result<Value, GatewayError>>>,
    fetch_default: Value,
    create_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    last_order: Mutex<Option<Value>>,
}

impl FakeGateway {
    fn with(create: CreateBehaviour) -> Self {
        Self {
            create,
            fetch_script: Mutex::new(VecDeque::new()),
            fetch_default: json!([{"payment_status": "SUCCESS", "cf_payment_id": 1}]),
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            last_order: Mutex::new(None),
        }
    }

    pub fn succeeding() -> Self {
        Self::with(CreateBehaviour::Order(json!({
            "cf_order_id": "2149460581",
            "order_status": "ACTIVE",
            "payment_session_id": "session_123"
        })))
    }

    pub fn returning_order(order: Value) -> Self {
        Self::with(CreateBehaviour::Order(order))
    }

    pub fn failing(error: GatewayError) -> Self {
        Self::with(CreateBehaviour::Fail(error))
    }

    pub fn hanging(delay: Duration) -> Self {
        Self::with(CreateBehaviour::Hang(delay))
    }

    /// Fetch results handed out in order; afterwards every fetch returns
    /// `fallback`.
    pub fn with_fetches(mut self, script: Vec<Result<Value, GatewayError>>, fallback: Value) -> Self {
        self.fetch_script = Mutex::new(script.into());
        self.fetch_default = fallback;
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn last_order(&self) -> Option<Value> {
        self.last_order.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<Value, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_order.lock().unwrap() = Some(serde_json::to_value(request).unwrap());

        match &self.create {
            CreateBehaviour::Order(order) => {
                let mut order = order.clone();
                if let Value::Object(fields) = &mut order {
                    fields
                        .entry("order_id")
                        .or_insert_with(|| json!(request.order_id.as_str()));
                }
                Ok(order)
            }
            CreateBehaviour::Fail(e) => Err(e.clone()),
            CreateBehaviour::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Err(GatewayError::Transport("hung".into()))
            }
        }
    }

    async fn fetch_payments(&self, _order_id: &str) -> Result<Value, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.fetch_script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fetch_default.clone()))
    }
}
