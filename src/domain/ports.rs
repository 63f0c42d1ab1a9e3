use async_trait::async_trait;
use uuid::Uuid;

use super::assembler::OrderAssembler;
use super::discount::DiscountCode;
use super::errors::DomainError;
use super::gateway::{BinInfo, PaymentRequest, PaymentResult, ThreeDsCompletion};
use super::order::{
    BankTransferNotice, Confirmation, ListResult, OrderStatus, OrderView, PlaceOrder, PlacedOrder,
    StatusTransition,
};

pub trait OrderRepository: Send + Sync + 'static {
    /// Validates, prices and persists the order graph atomically.
    fn place(&self, request: &PlaceOrder, assembler: &OrderAssembler) -> Result<PlacedOrder, DomainError>;
    fn find_by_number(&self, order_number: &str) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;
    fn transition(
        &self,
        order_number: &str,
        transition: StatusTransition,
    ) -> Result<OrderStatus, DomainError>;
    /// Marks a card order paid. Confirming twice is a no-op.
    fn confirm_payment(
        &self,
        order_number: &str,
        gateway_payment_id: &str,
    ) -> Result<Confirmation, DomainError>;
    fn add_bank_transfer_notice(
        &self,
        order_number: &str,
        notice: &BankTransferNotice,
    ) -> Result<Uuid, DomainError>;
}

pub trait DiscountRepository: Send + Sync + 'static {
    /// `code` is already normalized. Retired codes are not returned.
    fn find_by_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Returns the provider's challenge page, untouched.
    async fn initialize_three_ds(&self, request: &PaymentRequest) -> Result<String, DomainError>;
    async fn complete_three_ds(
        &self,
        completion: &ThreeDsCompletion,
    ) -> Result<PaymentResult, DomainError>;
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentResult, DomainError>;
    async fn check_bin(&self, bin_number: &str) -> Result<BinInfo, DomainError>;
    async fn payment_detail(&self, payment_id: &str) -> Result<PaymentResult, DomainError>;
}
