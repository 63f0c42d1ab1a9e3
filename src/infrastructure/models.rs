use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::assembler::VariantSnapshot;
use crate::domain::order::AddressFields;
use crate::schema::{
    bank_transfer_notifications, customer_addresses, discount_codes, order_addresses, order_items,
    orders,
};

// ── Catalog (read-only here) ─────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable)]
pub struct VariantRow {
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

impl From<VariantRow> for VariantSnapshot {
    fn from(row: VariantRow) -> Self {
        VariantSnapshot {
            id: row.id,
            sku: row.sku,
            name: row.name,
            price: row.price,
            discount_percent: row.discount_percent,
            tax_rate: row.tax_rate,
            is_published: row.is_published,
            deleted_at: row.deleted_at,
            product_active: row.product_active,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customer_addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerAddressRow {
    pub id: Uuid,
    pub customer_id: Uuid,
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

impl From<CustomerAddressRow> for AddressFields {
    fn from(row: CustomerAddressRow) -> Self {
        AddressFields {
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            district: row.district,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = discount_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DiscountCodeRow {
    pub id: Uuid,
    pub code: String,
    pub discount_type: String,
    pub amount: BigDecimal,
    pub applies_to_all: bool,
    pub max_uses: Option<i32>,
    pub times_used: i32,
    pub is_active: bool,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub email: String,
    pub status: String,
    pub payment_type: String,
    pub subtotal: BigDecimal,
    pub discount_total: BigDecimal,
    pub total: BigDecimal,
    pub price_at_gateway: BigDecimal,
    pub discount_code: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub email: String,
    pub status: String,
    pub payment_type: String,
    pub subtotal: BigDecimal,
    pub discount_total: BigDecimal,
    pub total: BigDecimal,
    pub price_at_gateway: BigDecimal,
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_addresses)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderAddressRow {
    pub id: Uuid,
    pub order_id: Uuid,
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

impl From<OrderAddressRow> for AddressFields {
    fn from(row: OrderAddressRow) -> Self {
        AddressFields {
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            district: row.district,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_addresses)]
pub struct NewOrderAddressRow {
    pub id: Uuid,
    pub order_id: Uuid,
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

impl NewOrderAddressRow {
    pub fn snapshot(order_id: Uuid, address: &AddressFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            full_name: address.full_name.clone(),
            email: address.email.clone(),
            phone: address.phone.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            city: address.city.clone(),
            district: address.district.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
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

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
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

#[derive(Debug, Insertable)]
#[diesel(table_name = bank_transfer_notifications)]
pub struct NewBankTransferNotificationRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sender_name: String,
    pub amount: BigDecimal,
    pub note: Option<String>,
}
