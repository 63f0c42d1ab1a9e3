use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::discount::{normalize_code, DiscountType, RedemptionPolicy};
use crate::domain::errors::DomainError;
use crate::domain::ports::DiscountRepository;

#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCheck {
    pub code: String,
    pub discount_type: DiscountType,
    /// Raw amount: currency for `Fixed`, percent for `Percentage`.
    pub discount_amount: BigDecimal,
}

pub struct DiscountService {
    repo: Arc<dyn DiscountRepository>,
    policy: RedemptionPolicy,
}

impl DiscountService {
    pub fn new(repo: Arc<dyn DiscountRepository>, policy: RedemptionPolicy) -> Self {
        Self { repo, policy }
    }

    /// Looks a code up for the given basket without applying or redeeming it.
    pub fn check_discount(
        &self,
        code: &str,
        variant_ids: &[Uuid],
    ) -> Result<DiscountCheck, DomainError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(DomainError::InvalidInput("code is required".into()));
        }

        let discount = self
            .repo
            .find_by_code(&code)?
            .ok_or(DomainError::DiscountNotFound)?;
        discount.check_applicable(variant_ids)?;
        discount.check_redeemable(self.policy)?;

        Ok(DiscountCheck {
            code: discount.code,
            discount_type: discount.discount_type,
            discount_amount: discount.amount,
        })
    }
}
