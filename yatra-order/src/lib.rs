pub mod orders;
pub mod verification;
pub mod webhook;

pub use orders::{CreatedOrder, OrderService};
pub use verification::{RetryPolicy, VerificationService};
pub use webhook::{SignatureVerifier, WebhookError, WebhookOutcome, WebhookProcessor};

#[cfg(test)]
pub(crate) mod testing;
