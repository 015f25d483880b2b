use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use yatra_shared::pii::Masked;

use crate::{CoreError, CoreResult};

pub const DEFAULT_PLACE_NAME: &str = "Museum";

/// Accepted in any case, on the JSON body and in query strings alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum VisitorType {
    Indian,
    Foreign,
}

impl VisitorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorType::Indian => "Indian",
            VisitorType::Foreign => "Foreign",
        }
    }
}

impl fmt::Display for VisitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitorType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indian" => Ok(VisitorType::Indian),
            "foreign" => Ok(VisitorType::Foreign),
            other => Err(CoreError::ValidationError(format!(
                "unknown visitor type '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for VisitorType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The form's number input posts its value as a string once edited.
fn ticket_count_from_form<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(count) => Ok(count),
        Count::Text(text) => text.trim().parse().map_err(|_| {
            D::Error::custom(format!("ticketCount must be a whole number, got '{}'", text))
        }),
    }
}

/// Booking form submission. Lives for one checkout attempt only.
///
/// Field names match what the booking form posts (`ticketCount` is the one
/// camel-cased field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub customer_name: String,
    pub customer_phone: Masked<String>,
    pub customer_email: Masked<String>,
    #[serde(rename = "ticketCount", deserialize_with = "ticket_count_from_form")]
    pub ticket_count: u32,
    pub visitor_type: VisitorType,
    pub visit_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
}

impl BookingRequest {
    /// Checks the request before anything is priced or sent to the gateway.
    /// There is no upper bound on the ticket count here.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ticket_count < 1 {
            return Err(CoreError::ValidationError(
                "ticketCount must be at least 1".to_string(),
            ));
        }

        let required = [
            ("customer_name", self.customer_name.as_str()),
            ("customer_phone", self.customer_phone.expose().as_str()),
            ("customer_email", self.customer_email.expose().as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::ValidationError(format!("{} is required", field)));
            }
        }

        Ok(())
    }

    pub fn place_name(&self) -> &str {
        self.place_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PLACE_NAME)
    }

    /// Gateway customer id; the phone number is the only stable identity the
    /// booking form collects.
    pub fn customer_id(&self) -> String {
        format!("cust_{}", self.customer_phone.expose().trim())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

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
}
