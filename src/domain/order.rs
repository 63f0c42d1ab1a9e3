use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::MAX_ITEM_QUANTITY;
use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentType {
    Card,
    BankTransfer,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Card => "CARD",
            PaymentType::BankTransfer => "BANK_TRANSFER",
        }
    }

    /// Status a freshly placed order starts in.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            PaymentType::Card => OrderStatus::Pending,
            PaymentType::BankTransfer => OrderStatus::AwaitingTransfer,
        }
    }
}

impl FromStr for PaymentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CARD" => Ok(PaymentType::Card),
            "BANK_TRANSFER" => Ok(PaymentType::BankTransfer),
            other => Err(DomainError::Internal(format!("unknown payment type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    AwaitingTransfer,
    Paid,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Confirm,
    Cancel,
    Refund,
}

impl StatusTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTransition::Confirm => "confirm",
            StatusTransition::Cancel => "cancel",
            StatusTransition::Refund => "refund",
        }
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::AwaitingTransfer => "AWAITING_TRANSFER",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    /// States that payment confirmation may move to `Paid`.
    pub const CONFIRMABLE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::AwaitingTransfer];

    pub fn apply(self, transition: StatusTransition) -> Result<OrderStatus, DomainError> {
        use OrderStatus::*;

        let next = match (self, transition) {
            (Pending | AwaitingTransfer, StatusTransition::Confirm) => Some(Paid),
            (Pending | AwaitingTransfer | Paid, StatusTransition::Cancel) => Some(Cancelled),
            (Paid, StatusTransition::Refund) => Some(Refunded),
            _ => None,
        };

        next.ok_or_else(|| DomainError::InvalidTransition {
            from: self.to_string(),
            action: transition.as_str().to_string(),
        })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "AWAITING_TRANSFER" => Ok(OrderStatus::AwaitingTransfer),
            "PAID" => Ok(OrderStatus::Paid),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "REFUNDED" => Ok(OrderStatus::Refunded),
            other => Err(DomainError::Internal(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub district: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl AddressFields {
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(DomainError::InvalidInput(format!("address.{field} is required")));
        }
        if !self.email.contains('@') {
            return Err(DomainError::InvalidInput("address.email is not valid".into()));
        }
        Ok(())
    }
}

/// Where the shipping address of a new order comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressRef {
    /// A saved address of the signed-in customer.
    ById(Uuid),
    /// Typed in at checkout, typically by a guest.
    Inline(AddressFields),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemInput {
    pub variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: Option<Uuid>,
    pub address: AddressRef,
    pub items: Vec<OrderItemInput>,
    pub discount_code: Option<String>,
    pub payment_type: PaymentType,
}

impl PlaceOrder {
    /// Rejects malformed requests before anything touches the database.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput("order has no items".into()));
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                return Err(DomainError::InvalidInput(format!(
                    "quantity for variant {} must be positive",
                    item.variant_id
                )));
            }
            if item.quantity > MAX_ITEM_QUANTITY {
                return Err(DomainError::InvalidInput(format!(
                    "quantity for variant {} cannot exceed {MAX_ITEM_QUANTITY}",
                    item.variant_id
                )));
            }
            if self.items[..i].iter().any(|o| o.variant_id == item.variant_id) {
                return Err(DomainError::InvalidInput(format!(
                    "variant {} listed more than once",
                    item.variant_id
                )));
            }
        }
        match &self.address {
            AddressRef::ById(_) if self.customer_id.is_none() => Err(DomainError::Unauthorized),
            AddressRef::ById(_) => Ok(()),
            AddressRef::Inline(fields) => fields.validate(),
        }
    }

    pub fn variant_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|i| i.variant_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub order_number: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemView {
    pub variant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit_price: BigDecimal,
    pub discount_percent: BigDecimal,
    pub tax_rate: BigDecimal,
    pub quantity: i32,
    pub final_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_type: PaymentType,
    pub subtotal: BigDecimal,
    pub discount_total: BigDecimal,
    pub total: BigDecimal,
    pub price_at_gateway: BigDecimal,
    pub discount_code: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub address: Option<AddressFields>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    AlreadyConfirmed,
}

/// Outcome for a payment that could not flip the order to paid. Only a
/// repeat of the payment already recorded is harmless.
pub fn confirmation_of(
    order_number: &str,
    status: OrderStatus,
    recorded_payment_id: Option<&str>,
    gateway_payment_id: &str,
) -> Result<Confirmation, DomainError> {
    match (status, recorded_payment_id) {
        (OrderStatus::Paid, Some(recorded)) if recorded == gateway_payment_id => {
            Ok(Confirmation::AlreadyConfirmed)
        }
        _ => Err(DomainError::Conflict(format!(
            "order {order_number} is {status} and cannot take payment {gateway_payment_id}"
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct BankTransferNotice {
    pub sender_name: String,
    pub amount: BigDecimal,
    pub note: Option<String>,
}
