pub mod booking;
pub mod checkout;
pub mod order_id;
pub mod payment;
pub mod pricing;
pub mod ticket;

pub use booking::{BookingRequest, VisitorType};
pub use order_id::OrderId;
pub use payment::{GatewayError, PaymentGateway};
pub use pricing::{PriceList, Quote};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Payment creation failed: {0}")]
    PaymentCreationFailed(#[source] GatewayError),
    #[error("Payment verification failed: {0}")]
    VerificationFailed(#[source] GatewayError),
    #[error("Random source unavailable: {0}")]
    RandomSourceUnavailable(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
