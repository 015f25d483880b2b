use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use url::Url;
use yatra_core::booking::{BookingRequest, VisitorType};
use yatra_core::payment::{self, GatewayError, GatewayOrderRequest, OrderMeta, PaymentGateway};
use yatra_core::pricing::{PriceList, Quote};
use yatra_core::ticket::return_url;
use yatra_core::{CoreError, CoreResult, OrderId};
use yatra_store::app_config::Config;

/// Result of a successful order creation.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub payment_session_id: String,
    pub quote: Quote,
    /// Gateway response body, returned to the browser as-is.
    pub gateway_order: Value,
}

/// Turns a booking into a gateway order and hosted checkout session.
/// Nothing is stored locally.
pub struct OrderService {
    gateway: Arc<dyn PaymentGateway>,
    prices: PriceList,
    return_base: Url,
    notify_url: Url,
    timeout: Duration,
}

impl OrderService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        prices: PriceList,
        return_base: Url,
        notify_url: Url,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            prices,
            return_base,
            notify_url,
            timeout,
        }
    }

    pub fn from_config(
        gateway: Arc<dyn PaymentGateway>,
        config: &Config,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(
            gateway,
            config.pricing.clone(),
            Url::parse(&config.urls.return_url)?,
            Url::parse(&config.urls.notify_url)?,
            config.gateway.timeout(),
        ))
    }

    /// Same rule the order is charged with.
    pub fn quote(&self, visitor_type: VisitorType, ticket_count: u32) -> CoreResult<Quote> {
        self.prices.quote(visitor_type, ticket_count)
    }

    #[instrument(skip_all, fields(visitor_type = %request.visitor_type, tickets = request.ticket_count))]
    pub async fn create_order(&self, request: &BookingRequest) -> CoreResult<CreatedOrder> {
        request.validate()?;
        let quote = self.quote(request.visitor_type, request.ticket_count)?;
        let order_id = OrderId::generate()?;

        let order_meta = OrderMeta {
            return_url: return_url(&self.return_base, &order_id, request).into(),
            notify_url: self.notify_url.to_string(),
        };
        let body = GatewayOrderRequest::new(order_id.clone(), &quote, request, order_meta);
        info!(
            "Requesting checkout session for order {} ({} {})",
            order_id, quote.amount, quote.currency
        );

        // Never retried: a second attempt could create a second gateway order.
        let gateway_order = match timeout(self.timeout, self.gateway.create_order(&body)).await {
            Ok(Ok(order)) => order,
            Ok(Err(e)) => {
                warn!("Gateway rejected order {}: {}", order_id, e);
                return Err(CoreError::PaymentCreationFailed(e));
            }
            Err(_) => {
                warn!("Gateway order creation for {} timed out", order_id);
                return Err(CoreError::PaymentCreationFailed(GatewayError::Timeout(
                    self.timeout,
                )));
            }
        };

        let payment_session_id =
            payment::payment_session_id(&gateway_order).map_err(CoreError::PaymentCreationFailed)?;

        info!("Checkout session ready for order {}", order_id);
        Ok(CreatedOrder {
            order_id,
            payment_session_id,
            quote,
            gateway_order,
        })
    }
}
