use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    Fixed,
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Fixed => "FIXED",
            DiscountType::Percentage => "PERCENTAGE",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIXED" => Ok(DiscountType::Fixed),
            "PERCENTAGE" => Ok(DiscountType::Percentage),
            other => Err(DomainError::Internal(format!("unknown discount type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applicability {
    All,
    Variants(HashSet<Uuid>),
}

/// Whether checkout counts redemptions against `max_uses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedemptionPolicy {
    /// Codes stay usable until an admin retires them.
    #[default]
    Unlimited,
    Limited,
}

impl FromStr for RedemptionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unlimited" => Ok(RedemptionPolicy::Unlimited),
            "limited" => Ok(RedemptionPolicy::Limited),
            other => Err(format!("unknown redemption policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCode {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub amount: BigDecimal,
    pub applicability: Applicability,
    pub max_uses: Option<i32>,
    pub times_used: i32,
}

impl DiscountCode {
    /// Fails with `DiscountNotApplicable` when the code is restricted to a set
    /// of variants and none of `variant_ids` is in it.
    pub fn check_applicable(&self, variant_ids: &[Uuid]) -> Result<(), DomainError> {
        match &self.applicability {
            Applicability::All => Ok(()),
            Applicability::Variants(allowed) => {
                if variant_ids.iter().any(|id| allowed.contains(id)) {
                    Ok(())
                } else {
                    Err(DomainError::DiscountNotApplicable)
                }
            }
        }
    }

    pub fn check_redeemable(&self, policy: RedemptionPolicy) -> Result<(), DomainError> {
        match (policy, self.max_uses) {
            (RedemptionPolicy::Limited, Some(max)) if self.times_used >= max => {
                Err(DomainError::DiscountExhausted)
            }
            _ => Ok(()),
        }
    }
}

/// Codes are typed by customers in any case; storage is uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Applies a code discount to an already item-discounted subtotal, clamping the
/// result at zero.
pub fn apply_discount(
    subtotal: &BigDecimal,
    discount_type: DiscountType,
    amount: &BigDecimal,
) -> BigDecimal {
    let total = match discount_type {
        DiscountType::Fixed => subtotal - amount,
        DiscountType::Percentage => {
            let hundred = BigDecimal::from(100);
            subtotal * (&hundred - amount) / hundred
        }
    };
    if total < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        total
    }
}
