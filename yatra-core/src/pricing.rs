use serde::{Deserialize, Serialize};

use crate::booking::VisitorType;
use crate::{CoreError, CoreResult};

pub const CURRENCY: &str = "INR";

/// Per-ticket prices in whole rupees.
///
/// This is the only pricing rule in the system: the quote shown before
/// checkout and the amount charged at order creation both come from
/// [`PriceList::quote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceList {
    #[serde(default = "default_indian")]
    pub indian: u32,
    #[serde(default = "default_foreign")]
    pub foreign: u32,
}

fn default_indian() -> u32 {
    100
}

fn default_foreign() -> u32 {
    500
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            indian: default_indian(),
            foreign: default_foreign(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub visitor_type: VisitorType,
    pub unit_price: u32,
    pub ticket_count: u32,
    pub amount: u64,
    pub currency: String,
}

impl PriceList {
    pub fn unit_price(&self, visitor_type: VisitorType) -> u32 {
        match visitor_type {
            VisitorType::Indian => self.indian,
            VisitorType::Foreign => self.foreign,
        }
    }

    pub fn quote(&self, visitor_type: VisitorType, ticket_count: u32) -> CoreResult<Quote> {
        if ticket_count < 1 {
            return Err(CoreError::ValidationError(
                "ticketCount must be at least 1".to_string(),
            ));
        }

        let unit_price = self.unit_price(visitor_type);
        Ok(Quote {
            visitor_type,
            unit_price,
            ticket_count,
            amount: u64::from(unit_price) * u64::from(ticket_count),
            currency: CURRENCY.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_is_unit_price_times_count() {
        let prices = PriceList::default();
        for count in 1..=10 {
            let quote = prices.quote(VisitorType::Indian, count).unwrap();
            assert_eq!(quote.amount, 100 * u64::from(count));
            assert!(quote.amount > 0);

            let quote = prices.quote(VisitorType::Foreign, count).unwrap();
            assert_eq!(quote.amount, 500 * u64::from(count));
        }
    }

    #[test]
    fn test_zero_tickets_not_quoted() {
        let result = PriceList::default().quote(VisitorType::Foreign, 0);
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_large_counts_do_not_overflow() {
        let prices = PriceList {
            indian: u32::MAX,
            foreign: u32::MAX,
        };
        let quote = prices.quote(VisitorType::Indian, u32::MAX).unwrap();
        assert_eq!(quote.amount, u64::from(u32::MAX) * u64::from(u32::MAX));
    }

    #[test]
    fn test_config_overrides() {
        let prices: PriceList = serde_json::from_str(r#"{"foreign": 650}"#).unwrap();
        assert_eq!(prices.unit_price(VisitorType::Indian), 100);
        assert_eq!(prices.unit_price(VisitorType::Foreign), 650);
    }
}
