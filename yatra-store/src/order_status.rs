use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Payment state of an order as last reported by gateway webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Pending,
    Paid,
    Failed,
    Dropped,
}

impl PaymentState {
    /// Map a gateway `payment_status`. Unknown values yield `None`.
    pub fn from_gateway(status: &str) -> Option<Self> {
        match status.to_ascii_uppercase().as_str() {
            "SUCCESS" => Some(PaymentState::Paid),
            "FAILED" => Some(PaymentState::Failed),
            "USER_DROPPED" | "CANCELLED" => Some(PaymentState::Dropped),
            "PENDING" | "NOT_ATTEMPTED" => Some(PaymentState::Pending),
            _ => None,
        }
    }

    /// `Paid` is final. A failed or dropped attempt can still be followed by
    /// a successful retry on the same order, but never goes back to pending.
    pub fn can_transition_to(self, next: PaymentState) -> bool {
        match (self, next) {
            (PaymentState::Paid, _) => false,
            (current, PaymentState::Pending) => current == PaymentState::Pending,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusRecord {
    pub order_id: String,
    pub state: PaymentState,
    pub payment_id: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    seen: HashSet<(Option<String>, PaymentState)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    /// Same payment and state delivered again.
    Duplicate,
    /// Not a legal move from the recorded state (e.g. anything after `Paid`).
    Ignored,
}

pub const DEFAULT_CAPACITY: usize = 100_000;

/// In-process record of webhook-reported payment states, keyed by order id.
/// Lost on restart; there is no durable order store.
///
/// Holds at most `capacity` orders; the least recently updated one is
/// dropped to make room. A record's `seen` set is not capped, it grows by one
/// entry per distinct signed (payment, state) delivery for that order.
#[derive(Debug)]
pub struct OrderStatusStore {
    records: RwLock<HashMap<String, OrderStatusRecord>>,
    capacity: usize,
}

impl Default for OrderStatusStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl OrderStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn apply(
        &self,
        order_id: &str,
        payment_id: Option<&str>,
        state: PaymentState,
    ) -> StatusUpdate {
        let event = (payment_id.map(str::to_string), state);
        let mut records = self.records.write().await;

        if !records.contains_key(order_id) && records.len() >= self.capacity {
            evict_oldest(&mut records);
        }

        match records.entry(order_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if record.seen.contains(&event) {
                    return StatusUpdate::Duplicate;
                }
                if !record.state.can_transition_to(state) {
                    info!(
                        "Ignoring {:?} for order {}: already {:?}",
                        state, order_id, record.state
                    );
                    return StatusUpdate::Ignored;
                }
                record.state = state;
                record.payment_id = event.0.clone();
                record.updated_at = Utc::now();
                record.seen.insert(event);
            }
            Entry::Vacant(entry) => {
                let payment_id = event.0.clone();
                entry.insert(OrderStatusRecord {
                    order_id: order_id.to_string(),
                    state,
                    payment_id,
                    updated_at: Utc::now(),
                    seen: HashSet::from([event]),
                });
            }
        }

        info!("Order {} is now {:?}", order_id, state);
        StatusUpdate::Applied
    }

    pub async fn get(&self, order_id: &str) -> Option<OrderStatusRecord> {
        self.records.read().await.get(order_id).cloned()
    }
}

fn evict_oldest(records: &mut HashMap<String, OrderStatusRecord>) {
    let oldest = records
        .values()
        .min_by_key(|record| record.updated_at)
        .map(|record| record.order_id.clone());
    if let Some(order_id) = oldest {
        info!("Status store full, dropping order {}", order_id);
        records.remove(&order_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_status_mapping() {
        assert_eq!(PaymentState::from_gateway("SUCCESS"), Some(PaymentState::Paid));
        assert_eq!(PaymentState::from_gateway("failed"), Some(PaymentState::Failed));
        assert_eq!(PaymentState::from_gateway("USER_DROPPED"), Some(PaymentState::Dropped));
        assert_eq!(PaymentState::from_gateway("FLAGGED"), None);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_applies_once() {
        let store = OrderStatusStore::new();
        assert_eq!(
            store.apply("deadbeefcafe", Some("pay_1"), PaymentState::Paid).await,
            StatusUpdate::Applied
        );
        let first = store.get("deadbeefcafe").await.unwrap();

        assert_eq!(
            store.apply("deadbeefcafe", Some("pay_1"), PaymentState::Paid).await,
            StatusUpdate::Duplicate
        );
        let second = store.get("deadbeefcafe").await.unwrap();
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_paid_is_terminal() {
        let store = OrderStatusStore::new();
        store.apply("deadbeefcafe", Some("pay_1"), PaymentState::Paid).await;
        assert_eq!(
            store.apply("deadbeefcafe", Some("pay_2"), PaymentState::Failed).await,
            StatusUpdate::Ignored
        );
        let record = store.get("deadbeefcafe").await.unwrap();
        assert_eq!(record.state, PaymentState::Paid);
        assert_eq!(record.payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn test_failed_attempt_then_success() {
        let store = OrderStatusStore::new();
        store.apply("0123456789ab", Some("pay_1"), PaymentState::Failed).await;
        assert_eq!(
            store.apply("0123456789ab", Some("pay_1"), PaymentState::Pending).await,
            StatusUpdate::Ignored
        );
        assert_eq!(
            store.apply("0123456789ab", Some("pay_2"), PaymentState::Paid).await,
            StatusUpdate::Applied
        );
        assert_eq!(store.get("0123456789ab").await.unwrap().state, PaymentState::Paid);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        assert!(OrderStatusStore::new().get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_updated() {
        let store = OrderStatusStore::with_capacity(2);
        store.apply("aaaaaaaaaaaa", Some("pay_1"), PaymentState::Pending).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.apply("bbbbbbbbbbbb", Some("pay_2"), PaymentState::Pending).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.apply("aaaaaaaaaaaa", Some("pay_1"), PaymentState::Paid).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        store.apply("cccccccccccc", Some("pay_3"), PaymentState::Failed).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get("bbbbbbbbbbbb").await.is_none());
        assert_eq!(store.get("aaaaaaaaaaaa").await.unwrap().state, PaymentState::Paid);
        assert!(store.get("cccccccccccc").await.is_some());
    }
}
