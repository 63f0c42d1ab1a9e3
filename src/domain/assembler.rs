//! Turns a checkout request plus the catalog rows it references into a fully
//! priced order, ready to be written in one transaction.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::discount::{apply_discount, normalize_code, DiscountCode, RedemptionPolicy};
use super::errors::DomainError;
use super::order::{AddressFields, OrderStatus, PaymentType, PlaceOrder};
use super::order_number;
use super::pricing::{calculate_price, line_total, round_money};

/// Catalog state of a variant as read inside the order transaction.
#[derive(Debug, Clone)]
pub struct VariantSnapshot {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub price: BigDecimal,
    pub discount_percent: BigDecimal,
    pub tax_rate: BigDecimal,
    pub is_published: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub product_active: bool,
}

impl VariantSnapshot {
    pub fn is_purchasable(&self) -> bool {
        self.is_published && self.deleted_at.is_none() && self.product_active
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledItem {
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
pub struct AssembledOrder {
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_type: PaymentType,
    pub address: AddressFields,
    pub items: Vec<AssembledItem>,
    pub subtotal: BigDecimal,
    pub discount_total: BigDecimal,
    pub total: BigDecimal,
    pub discount_code: Option<String>,
    /// Set when the redemption must be counted against the code.
    pub redeemed_discount_id: Option<Uuid>,
}

impl AssembledOrder {
    /// Amount handed to the payment gateway.
    pub fn price_at_gateway(&self) -> &BigDecimal {
        &self.total
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderAssembler {
    policy: RedemptionPolicy,
}

impl OrderAssembler {
    pub fn new(policy: RedemptionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RedemptionPolicy {
        self.policy
    }

    /// `variants` holds whatever rows the lookup found; anything requested but
    /// missing or not purchasable fails the whole order. `discount` is the
    /// lookup result for `request.discount_code`.
    pub fn assemble(
        &self,
        request: &PlaceOrder,
        address: AddressFields,
        variants: &[VariantSnapshot],
        discount: Option<&DiscountCode>,
        now: DateTime<Utc>,
    ) -> Result<AssembledOrder, DomainError> {
        let mut items = Vec::with_capacity(request.items.len());
        let mut subtotal = BigDecimal::zero();

        for input in &request.items {
            let variant = variants
                .iter()
                .find(|v| v.id == input.variant_id)
                .filter(|v| v.is_purchasable())
                .ok_or(DomainError::ItemUnavailable(input.variant_id))?;

            let price = calculate_price(&variant.price, &variant.discount_percent, &variant.tax_rate);
            let total = round_money(&line_total(&price, input.quantity));

            items.push(AssembledItem {
                variant_id: variant.id,
                sku: variant.sku.clone(),
                name: variant.name.clone(),
                unit_price: variant.price.clone(),
                discount_percent: variant.discount_percent.clone(),
                tax_rate: variant.tax_rate.clone(),
                quantity: input.quantity,
                final_price: round_money(&price.final_price),
                line_total: total.clone(),
            });
            // Sum of the persisted line totals, so the stored order adds up.
            subtotal += total;
        }

        let (total, discount_code, redeemed_discount_id) = match &request.discount_code {
            None => (subtotal.clone(), None, None),
            Some(raw) => {
                let code = discount
                    .filter(|d| d.code == normalize_code(raw))
                    .ok_or(DomainError::DiscountNotFound)?;
                code.check_applicable(&request.variant_ids())?;
                code.check_redeemable(self.policy)?;

                let redeemed = match self.policy {
                    RedemptionPolicy::Limited => Some(code.id),
                    RedemptionPolicy::Unlimited => None,
                };
                (
                    apply_discount(&subtotal, code.discount_type, &code.amount),
                    Some(code.code.clone()),
                    redeemed,
                )
            }
        };

        let total = round_money(&total);
        let discount_total = &subtotal - &total;

        Ok(AssembledOrder {
            order_number: order_number::generate(now),
            customer_id: request.customer_id,
            status: request.payment_type.initial_status(),
            payment_type: request.payment_type,
            address,
            items,
            subtotal,
            discount_total,
            total,
            discount_code,
            redeemed_discount_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::*;
    use crate::domain::discount::{Applicability, DiscountType};
    use crate::domain::order::{AddressRef, OrderItemInput};

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn address() -> AddressFields {
        AddressFields {
            full_name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            phone: "+905550000000".into(),
            line1: "Moda Cd. 1".into(),
            line2: None,
            city: "Istanbul".into(),
            district: None,
            postal_code: "34710".into(),
            country: "Turkey".into(),
        }
    }

    fn variant(price: &str, discount: &str, tax: &str) -> VariantSnapshot {
        VariantSnapshot {
            id: Uuid::new_v4(),
            sku: "SKU-1".into(),
            name: "Espresso beans 1kg".into(),
            price: dec(price),
            discount_percent: dec(discount),
            tax_rate: dec(tax),
            is_published: true,
            deleted_at: None,
            product_active: true,
        }
    }

    fn request(variants: &[&VariantSnapshot], code: Option<&str>) -> PlaceOrder {
        PlaceOrder {
            customer_id: None,
            address: AddressRef::Inline(address()),
            items: variants
                .iter()
                .map(|v| OrderItemInput { variant_id: v.id, quantity: 1 })
                .collect(),
            discount_code: code.map(str::to_string),
            payment_type: PaymentType::Card,
        }
    }

    fn discount(discount_type: DiscountType, amount: &str) -> DiscountCode {
        DiscountCode {
            id: Uuid::new_v4(),
            code: "WELCOME".into(),
            discount_type,
            amount: dec(amount),
            applicability: Applicability::All,
            max_uses: Some(1),
            times_used: 0,
        }
    }

    #[test]
    fn prices_each_line_with_discount_and_tax() {
        let v = variant("100", "10", "20");
        let order = OrderAssembler::default()
            .assemble(&request(&[&v], None), address(), &[v.clone()], None, Utc::now())
            .unwrap();

        assert_eq!(order.items[0].final_price, dec("108.00"));
        assert_eq!(order.total, dec("108.00"));
        assert_eq!(order.discount_total, dec("0"));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn fixed_code_comes_off_the_sum() {
        let (a, b) = (variant("50", "0", "0"), variant("150", "0", "0"));
        let code = discount(DiscountType::Fixed, "20");
        let order = OrderAssembler::default()
            .assemble(
                &request(&[&a, &b], Some("welcome")),
                address(),
                &[a.clone(), b.clone()],
                Some(&code),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(order.subtotal, dec("200"));
        assert_eq!(order.total, dec("180"));
        assert_eq!(order.discount_total, dec("20"));
        assert_eq!(order.discount_code.as_deref(), Some("WELCOME"));
    }

    #[test]
    fn percentage_code_scales_the_sum() {
        let (a, b) = (variant("50", "0", "0"), variant("150", "0", "0"));
        let code = discount(DiscountType::Percentage, "50");
        let order = OrderAssembler::default()
            .assemble(
                &request(&[&a, &b], Some("WELCOME")),
                address(),
                &[a.clone(), b.clone()],
                Some(&code),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(order.total, dec("100"));
    }

    #[test]
    fn item_discount_applies_before_code_discount() {
        // 200 at 50% off = 100, then FIXED 30 = 70 (not (200 - 30) × 0.5 = 85)
        let v = variant("200", "50", "0");
        let code = discount(DiscountType::Fixed, "30");
        let order = OrderAssembler::default()
            .assemble(&request(&[&v], Some("WELCOME")), address(), &[v.clone()], Some(&code), Utc::now())
            .unwrap();

        assert_eq!(order.total, dec("70"));
    }

    #[test]
    fn oversized_fixed_code_clamps_to_zero() {
        let v = variant("10", "0", "0");
        let code = discount(DiscountType::Fixed, "25");
        let order = OrderAssembler::default()
            .assemble(&request(&[&v], Some("WELCOME")), address(), &[v.clone()], Some(&code), Utc::now())
            .unwrap();

        assert_eq!(order.total, dec("0"));
        assert_eq!(order.discount_total, dec("10"));
    }

    #[test]
    fn soft_deleted_variant_is_unavailable() {
        let mut v = variant("10", "0", "0");
        v.deleted_at = Some(Utc::now());
        let err = OrderAssembler::default()
            .assemble(&request(&[&v], None), address(), &[v.clone()], None, Utc::now())
            .unwrap_err();

        assert_eq!(err, DomainError::ItemUnavailable(v.id));
    }

    #[test]
    fn unpublished_or_inactive_or_missing_variant_is_unavailable() {
        let mut unpublished = variant("10", "0", "0");
        unpublished.is_published = false;
        let mut inactive = variant("10", "0", "0");
        inactive.product_active = false;
        let missing = variant("10", "0", "0");

        for (v, rows) in [
            (&unpublished, vec![unpublished.clone()]),
            (&inactive, vec![inactive.clone()]),
            (&missing, vec![]),
        ] {
            let err = OrderAssembler::default()
                .assemble(&request(&[v], None), address(), &rows, None, Utc::now())
                .unwrap_err();
            assert_eq!(err, DomainError::ItemUnavailable(v.id));
        }
    }

    #[test]
    fn unknown_code_fails_the_order() {
        let v = variant("10", "0", "0");
        let err = OrderAssembler::default()
            .assemble(&request(&[&v], Some("NOPE")), address(), &[v.clone()], None, Utc::now())
            .unwrap_err();

        assert_eq!(err, DomainError::DiscountNotFound);
    }

    #[test]
    fn restricted_code_for_other_variants_fails_the_order() {
        let v = variant("10", "0", "0");
        let mut code = discount(DiscountType::Fixed, "1");
        code.applicability = Applicability::Variants(HashSet::from([Uuid::new_v4()]));
        let err = OrderAssembler::default()
            .assemble(&request(&[&v], Some("WELCOME")), address(), &[v.clone()], Some(&code), Utc::now())
            .unwrap_err();

        assert_eq!(err, DomainError::DiscountNotApplicable);
    }

    #[test]
    fn limited_policy_records_the_redemption() {
        let v = variant("10", "0", "0");
        let code = discount(DiscountType::Fixed, "1");
        let order = OrderAssembler::new(RedemptionPolicy::Limited)
            .assemble(&request(&[&v], Some("WELCOME")), address(), &[v.clone()], Some(&code), Utc::now())
            .unwrap();
        assert_eq!(order.redeemed_discount_id, Some(code.id));

        let mut used = code.clone();
        used.times_used = 1;
        let err = OrderAssembler::new(RedemptionPolicy::Limited)
            .assemble(&request(&[&v], Some("WELCOME")), address(), &[v.clone()], Some(&used), Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::DiscountExhausted);
    }

    #[test]
    fn unlimited_policy_leaves_the_code_alone() {
        let v = variant("10", "0", "0");
        let mut code = discount(DiscountType::Fixed, "1");
        code.times_used = 40;
        let order = OrderAssembler::default()
            .assemble(&request(&[&v], Some("WELCOME")), address(), &[v.clone()], Some(&code), Utc::now())
            .unwrap();

        assert_eq!(order.redeemed_discount_id, None);
    }

    #[test]
    fn persisted_total_matches_recomputed_lines() {
        let variants: Vec<VariantSnapshot> = [
            ("19.99", "15", "18"),
            ("3.33", "0", "8"),
            ("0.10", "33.3", "20"),
            ("1250", "12.5", "1"),
        ]
        .iter()
        .map(|(p, d, t)| variant(p, d, t))
        .collect();
        let mut req = request(&variants.iter().collect::<Vec<_>>(), Some("WELCOME"));
        for (i, item) in req.items.iter_mut().enumerate() {
            item.quantity = i as i32 + 1;
        }
        let code = discount(DiscountType::Percentage, "7.5");

        let order = OrderAssembler::default()
            .assemble(&req, address(), &variants, Some(&code), Utc::now())
            .unwrap();

        let lines: BigDecimal = order.items.iter().map(|i| &i.line_total).sum();
        let recomputed = lines - &order.discount_total;
        let drift = (&recomputed - &order.total).abs();
        assert!(drift <= dec("0.01"), "drift {drift}");
        assert_eq!(&order.subtotal - &order.discount_total, order.total);
    }

    #[test]
    fn subtotal_is_the_sum_of_rounded_lines() {
        // 19.95 at 10% off = 17.955 per line; four lines each round up
        let variants: Vec<VariantSnapshot> =
            (0..4).map(|_| variant("19.95", "10", "0")).collect();
        let order = OrderAssembler::default()
            .assemble(
                &request(&variants.iter().collect::<Vec<_>>(), None),
                address(),
                &variants,
                None,
                Utc::now(),
            )
            .unwrap();

        let lines: BigDecimal = order.items.iter().map(|i| &i.line_total).sum();
        assert!(order.items.iter().all(|i| i.line_total == dec("17.96")));
        assert_eq!(lines, dec("71.84"));
        assert_eq!(order.subtotal, lines);
        assert_eq!(order.total, dec("71.84"));
    }
}
