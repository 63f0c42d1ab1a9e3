//! Lifecycle of a single card payment attempt.
//!
//! ```text
//! Init ──► SignedRequestSent ──┬──► ThreeDsRedirect ──┬──► Confirmed
//!                              └──► DirectResult ─────┴──► Failed
//! ```
//! `Failed` is also reachable straight from `SignedRequestSent` when the
//! gateway rejects or cannot be reached.

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Init,
    SignedRequestSent,
    ThreeDsRedirect,
    DirectResult,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    order_number: String,
    state: PaymentState,
}

impl PaymentAttempt {
    pub fn new(order_number: impl Into<String>) -> Self {
        Self {
            order_number: order_number.into(),
            state: PaymentState::Init,
        }
    }

    /// Resumes an attempt whose 3DS challenge was completed in the browser.
    pub fn resume_after_challenge(order_number: impl Into<String>) -> Self {
        Self {
            order_number: order_number.into(),
            state: PaymentState::ThreeDsRedirect,
        }
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn state(&self) -> PaymentState {
        self.state
    }

    pub fn request_sent(&mut self) -> Result<(), DomainError> {
        self.advance(PaymentState::SignedRequestSent)
    }

    pub fn redirect_to_challenge(&mut self) -> Result<(), DomainError> {
        self.advance(PaymentState::ThreeDsRedirect)
    }

    pub fn direct_result(&mut self) -> Result<(), DomainError> {
        self.advance(PaymentState::DirectResult)
    }

    pub fn confirm(&mut self) -> Result<(), DomainError> {
        self.advance(PaymentState::Confirmed)
    }

    /// Moving to `Failed` is allowed from any non-terminal state.
    pub fn fail(&mut self) {
        if !self.is_terminal() {
            self.state = PaymentState::Failed;
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, PaymentState::Confirmed | PaymentState::Failed)
    }

    fn advance(&mut self, next: PaymentState) -> Result<(), DomainError> {
        use PaymentState::*;

        let allowed = matches!(
            (self.state, next),
            (Init, SignedRequestSent)
                | (SignedRequestSent, ThreeDsRedirect)
                | (SignedRequestSent, DirectResult)
                | (ThreeDsRedirect, SignedRequestSent)
                | (ThreeDsRedirect, Confirmed)
                | (DirectResult, Confirmed)
        );
        if !allowed {
            return Err(DomainError::Internal(format!(
                "payment for {} cannot move from {:?} to {:?}",
                self.order_number, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}
