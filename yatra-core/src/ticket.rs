use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::{form_urlencoded, Url};

use crate::booking::BookingRequest;
use crate::order_id::OrderId;

pub const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";
pub const QR_SIZE: &str = "200x200";

const DEMO_TICKET_ID: &str = "TKT-DEMO1234";

/// Build the gateway return URL. Everything the confirmation page shows is
/// carried in the query so it can render without another server call.
pub fn return_url(base: &Url, order_id: &OrderId, booking: &BookingRequest) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("order_id", order_id.as_str())
        .append_pair("customer_name", booking.customer_name.trim())
        .append_pair("customer_email", booking.customer_email.expose().trim())
        .append_pair("visitor_type", booking.visitor_type.as_str())
        .append_pair("ticket_count", &booking.ticket_count.to_string())
        .append_pair("visit_date", &booking.visit_date.to_string())
        .append_pair("place_name", booking.place_name());
    url
}

/// Display-only ticket reconstructed from return-URL parameters.
///
/// Nothing here is authoritative: anyone can type these parameters. Whether
/// the order is actually paid comes from payment verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub order_id: Option<String>,
    pub payment_status: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub visitor_type: String,
    pub ticket_count: String,
    pub visit_date: String,
    pub place_name: String,
    pub ticket_id: String,
}

impl TicketView {
    pub fn from_query(query: &str, today: NaiveDate) -> Self {
        let mut view = Self {
            order_id: None,
            payment_status: None,
            customer_name: "John Doe".to_string(),
            customer_email: "visitor@example.com".to_string(),
            visitor_type: "Adult".to_string(),
            ticket_count: "1".to_string(),
            visit_date: today.to_string(),
            place_name: "Museum".to_string(),
            ticket_id: String::new(),
        };

        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            // The gateway leaves `$order_id`-style placeholders in place when
            // it has nothing to substitute.
            if value.is_empty() || value.starts_with('$') {
                continue;
            }
            let value = value.into_owned();
            match &*key {
                "order_id" => view.order_id = Some(value),
                "payment_status" => view.payment_status = Some(value),
                "customer_name" => view.customer_name = value,
                "customer_email" => view.customer_email = value,
                "visitor_type" => view.visitor_type = value,
                "ticket_count" => view.ticket_count = value,
                "visit_date" => view.visit_date = value,
                "place_name" => view.place_name = value,
                _ => {}
            }
        }

        view.ticket_id = ticket_id(view.order_id.as_deref());
        view
    }

    pub fn qr_payload(&self) -> serde_json::Value {
        json!({
            "ticketId": self.ticket_id,
            "orderId": self.order_id,
            "customerName": self.customer_name,
            "visitDate": self.visit_date,
            "ticketCount": self.ticket_count,
        })
    }

    /// Image URL on the external QR rendering service. The payload is plain
    /// JSON in the query string, not a signed token.
    pub fn qr_code_url(&self, service: &Url) -> Url {
        let mut url = service.clone();
        url.query_pairs_mut()
            .append_pair("size", QR_SIZE)
            .append_pair("data", &self.qr_payload().to_string());
        url
    }
}

/// `TKT-` followed by the first eight characters of the order id, uppercased.
pub fn ticket_id(order_id: Option<&str>) -> String {
    match order_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            let prefix: String = id.chars().take(8).collect();
            format!("TKT-{}", prefix.to_uppercase())
        }
        None => DEMO_TICKET_ID.to_string(),
    }
}
