//! Browser-side checkout orchestration.
//!
//! One [`CheckoutFlow`] per purchase attempt. Each phase is advanced by the
//! `Result` of the previous asynchronous call, so the phases can only run in
//! order:
//!
//! `Idle → SessionRequested → SessionReceived → GatewayCheckoutOpen →
//! VerificationRequested → {Verified, VerificationFailed}`
//!
//! plus the terminal `SessionFailed` (order creation failed) and `Cancelled`
//! (the hosted checkout was dismissed; verification is skipped).

use std::mem;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::booking::BookingRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub order_id: String,
    pub payment_session_id: String,
}

/// How the hosted checkout is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectTarget {
    #[serde(rename = "_modal")]
    Modal,
    #[serde(rename = "_self")]
    SameTab,
    #[serde(rename = "_blank")]
    NewTab,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOptions {
    pub payment_session_id: String,
    pub redirect_target: RedirectTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed,
    Dismissed,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("cannot {event} while {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
    #[error("session request failed: {0}")]
    Session(String),
    #[error("verification failed: {0}")]
    Verification(String),
    #[error("hosted checkout failed: {0}")]
    HostedCheckout(String),
}

/// The server side of checkout: order creation and verification.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn request_session(&self, booking: &BookingRequest)
        -> Result<CheckoutSession, CheckoutError>;

    async fn verify(&self, order_id: &str) -> Result<Value, CheckoutError>;
}

/// The gateway's hosted checkout UI.
#[async_trait]
pub trait HostedCheckout: Send + Sync {
    async fn open(&self, options: &CheckoutOptions) -> Result<CheckoutOutcome, CheckoutError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    SessionRequested,
    SessionReceived {
        order_id: String,
        payment_session_id: String,
    },
    GatewayCheckoutOpen {
        order_id: String,
    },
    VerificationRequested {
        order_id: String,
    },
    Verified {
        order_id: String,
        payments: Value,
    },
    VerificationFailed {
        order_id: String,
        reason: String,
    },
    SessionFailed {
        reason: String,
    },
    Cancelled {
        order_id: String,
    },
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::SessionRequested => "session requested",
            CheckoutState::SessionReceived { .. } => "session received",
            CheckoutState::GatewayCheckoutOpen { .. } => "gateway checkout open",
            CheckoutState::VerificationRequested { .. } => "verification requested",
            CheckoutState::Verified { .. } => "verified",
            CheckoutState::VerificationFailed { .. } => "verification failed",
            CheckoutState::SessionFailed { .. } => "session failed",
            CheckoutState::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Verified { .. }
                | CheckoutState::VerificationFailed { .. }
                | CheckoutState::SessionFailed { .. }
                | CheckoutState::Cancelled { .. }
        )
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            CheckoutState::SessionReceived { order_id, .. }
            | CheckoutState::GatewayCheckoutOpen { order_id }
            | CheckoutState::VerificationRequested { order_id }
            | CheckoutState::Verified { order_id, .. }
            | CheckoutState::VerificationFailed { order_id, .. }
            | CheckoutState::Cancelled { order_id } => Some(order_id),
            CheckoutState::Idle
            | CheckoutState::SessionRequested
            | CheckoutState::SessionFailed { .. } => None,
        }
    }
}

/// Per-attempt state, held in memory only.
#[derive(Debug)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self {
            state: CheckoutState::Idle,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn into_state(self) -> CheckoutState {
        self.state
    }

    fn invalid(&self, event: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            from: self.state.name(),
            event,
        }
    }

    /// Booking form submitted.
    pub fn submit(&mut self) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::Idle => {
                self.state = CheckoutState::SessionRequested;
                Ok(())
            }
            _ => Err(self.invalid("submit a booking")),
        }
    }

    pub fn session_result(
        &mut self,
        result: Result<CheckoutSession, CheckoutError>,
    ) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::SessionRequested {
            return Err(self.invalid("accept a session"));
        }

        self.state = match result {
            Ok(session) => CheckoutState::SessionReceived {
                order_id: session.order_id,
                payment_session_id: session.payment_session_id,
            },
            Err(e) => CheckoutState::SessionFailed {
                reason: e.to_string(),
            },
        };
        Ok(())
    }

    /// Hand the session token to the hosted checkout, as a modal.
    pub fn open_gateway(&mut self) -> Result<CheckoutOptions, CheckoutError> {
        match mem::replace(&mut self.state, CheckoutState::Idle) {
            CheckoutState::SessionReceived {
                order_id,
                payment_session_id,
            } => {
                self.state = CheckoutState::GatewayCheckoutOpen { order_id };
                Ok(CheckoutOptions {
                    payment_session_id,
                    redirect_target: RedirectTarget::Modal,
                })
            }
            other => {
                self.state = other;
                Err(self.invalid("open the hosted checkout"))
            }
        }
    }

    /// A completed checkout and a hosted-UI error both move on to
    /// verification: the payment may have gone through either way, and
    /// verification is a read. Only an explicit dismissal cancels.
    pub fn gateway_result(
        &mut self,
        result: Result<CheckoutOutcome, CheckoutError>,
    ) -> Result<(), CheckoutError> {
        match mem::replace(&mut self.state, CheckoutState::Idle) {
            CheckoutState::GatewayCheckoutOpen { order_id } => {
                self.state = match result {
                    Ok(CheckoutOutcome::Dismissed) => CheckoutState::Cancelled { order_id },
                    Ok(CheckoutOutcome::Completed) => {
                        CheckoutState::VerificationRequested { order_id }
                    }
                    Err(e) => {
                        tracing::warn!("Hosted checkout for order {} reported: {}", order_id, e);
                        CheckoutState::VerificationRequested { order_id }
                    }
                };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("close the hosted checkout"))
            }
        }
    }

    pub fn verification_result(
        &mut self,
        result: Result<Value, CheckoutError>,
    ) -> Result<(), CheckoutError> {
        match mem::replace(&mut self.state, CheckoutState::Idle) {
            CheckoutState::VerificationRequested { order_id } => {
                self.state = match result {
                    Ok(payments) => CheckoutState::Verified { order_id, payments },
                    Err(e) => CheckoutState::VerificationFailed {
                        order_id,
                        reason: e.to_string(),
                    },
                };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("record a verification"))
            }
        }
    }

    /// Drive a whole attempt to a terminal state.
    pub async fn run(
        mut self,
        backend: &dyn CheckoutBackend,
        hosted: &dyn HostedCheckout,
        booking: &BookingRequest,
    ) -> Result<CheckoutState, CheckoutError> {
        self.submit()?;
        self.session_result(backend.request_session(booking).await)?;
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let options = self.open_gateway()?;
        self.gateway_result(hosted.open(&options).await)?;

        if let CheckoutState::VerificationRequested { order_id } = &self.state {
            let order_id = order_id.clone();
            self.verification_result(backend.verify(&order_id).await)?;
        }

        Ok(self.state)
    }
}
