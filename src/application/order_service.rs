use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use crate::domain::assembler::OrderAssembler;
use crate::domain::discount::normalize_code;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    BankTransferNotice, ListResult, OrderStatus, OrderView, PaymentType, PlaceOrder, PlacedOrder,
    StatusTransition,
};
use crate::domain::ports::OrderRepository;

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    assembler: OrderAssembler,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, assembler: OrderAssembler) -> Self {
        Self { repo, assembler }
    }

    pub fn create_order(&self, mut request: PlaceOrder) -> Result<PlacedOrder, DomainError> {
        request.validate()?;
        request.discount_code = request
            .discount_code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());

        let placed = self.repo.place(&request, &self.assembler)?;
        log::info!(
            "Order {} placed ({} items, {})",
            placed.order_number,
            request.items.len(),
            request.payment_type.as_str()
        );
        Ok(placed)
    }

    pub fn get_order(&self, order_number: &str) -> Result<OrderView, DomainError> {
        self.repo
            .find_by_number(order_number)?
            .ok_or(DomainError::NotFound("Order"))
    }

    pub fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.repo.list(page, limit)
    }

    pub fn transition(
        &self,
        order_number: &str,
        transition: StatusTransition,
    ) -> Result<OrderStatus, DomainError> {
        let status = self.repo.transition(order_number, transition)?;
        log::info!("Order {} -> {} ({})", order_number, status, transition.as_str());
        Ok(status)
    }

    /// Records a customer's claim of having paid by bank transfer. An admin
    /// still has to confirm the order.
    pub fn submit_bank_transfer_notice(
        &self,
        order_number: &str,
        notice: BankTransferNotice,
    ) -> Result<Uuid, DomainError> {
        if notice.sender_name.trim().is_empty() {
            return Err(DomainError::InvalidInput("sender_name is required".into()));
        }
        if notice.amount <= BigDecimal::zero() {
            return Err(DomainError::InvalidInput("amount must be positive".into()));
        }

        let order = self.get_order(order_number)?;
        if order.payment_type != PaymentType::BankTransfer {
            return Err(DomainError::Conflict(format!(
                "order {order_number} is not paid by bank transfer"
            )));
        }
        if order.status != OrderStatus::AwaitingTransfer {
            return Err(DomainError::Conflict(format!(
                "order {order_number} is {} and no longer awaits a transfer",
                order.status
            )));
        }

        let id = self.repo.add_bank_transfer_notice(order_number, &notice)?;
        log::info!("Bank transfer notice {} received for order {}", id, order_number);
        Ok(id)
    }
}
