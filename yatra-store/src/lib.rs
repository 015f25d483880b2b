pub mod app_config;
pub mod cashfree;
pub mod order_status;

pub use cashfree::CashfreeGateway;
pub use order_status::{OrderStatusStore, PaymentState, StatusUpdate};
