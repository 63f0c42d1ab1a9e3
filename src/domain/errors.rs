use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Address not found")]
    AddressNotFound,
    #[error("Item {0} is not available for purchase")]
    ItemUnavailable(Uuid),
    #[error("Discount code not found")]
    DiscountNotFound,
    #[error("Discount code does not apply to these items")]
    DiscountNotApplicable,
    #[error("Discount code has reached its usage limit")]
    DiscountExhausted,
    #[error("Cannot {action} an order that is {from}")]
    InvalidTransition { from: String, action: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Payment rejected by gateway ({code}): {message}")]
    Gateway { code: String, message: String },
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("Transaction timed out")]
    Timeout,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stable machine-readable code exposed to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidInput(_) => "VALIDATION_ERROR",
            DomainError::Unauthorized => "UNAUTHORIZED",
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::AddressNotFound => "ADDRESS_NOT_FOUND",
            DomainError::ItemUnavailable(_) => "ITEM_UNAVAILABLE",
            DomainError::DiscountNotFound => "DISCOUNT_NOT_FOUND",
            DomainError::DiscountNotApplicable => "DISCOUNT_NOT_APPLICABLE",
            DomainError::DiscountExhausted => "DISCOUNT_EXHAUSTED",
            DomainError::InvalidTransition { .. } | DomainError::Conflict(_) => "CONFLICT",
            DomainError::Gateway { .. } => "THIRD_PARTY_FAILURE",
            DomainError::GatewayUnavailable(_) => "THIRD_PARTY_UNAVAILABLE",
            DomainError::Timeout => "TRANSACTION_TIMEOUT",
            DomainError::Internal(_) => "UNKNOWN",
        }
    }

    /// Transient failures the customer may simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Gateway { .. } | DomainError::GatewayUnavailable(_) | DomainError::Timeout
        )
    }
}
