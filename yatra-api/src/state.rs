use std::sync::Arc;

use url::Url;
use yatra_order::{OrderService, VerificationService, WebhookProcessor};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub verification: Arc<VerificationService>,
    pub webhooks: Arc<WebhookProcessor>,
    pub metrics: Arc<Metrics>,
    pub qr_service: Url,
}
