use std::str::FromStr;
use std::time::{Duration, Instant};

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::assembler::{AssembledOrder, OrderAssembler, VariantSnapshot};
use crate::domain::discount::normalize_code;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    confirmation_of, AddressFields, AddressRef, BankTransferNotice, Confirmation, ListResult,
    OrderItemView, OrderStatus, OrderView, PaymentType, PlaceOrder, PlacedOrder, StatusTransition,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{
    bank_transfer_notifications, customer_addresses, discount_codes, order_addresses, order_items,
    orders, product_variants, products,
};

use super::discount_repo::load_active_discount;
use super::models::{
    CustomerAddressRow, NewBankTransferNotificationRow, NewOrderAddressRow, NewOrderItemRow,
    NewOrderRow, OrderAddressRow, OrderItemRow, OrderRow, VariantRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                log::warn!("Unique constraint violated: {}", info.message());
                DomainError::Conflict("record already exists".into())
            }
            DieselError::DatabaseError(_, info) if info.message().contains("statement timeout") => {
                DomainError::Timeout
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
    tx_timeout: Duration,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool, tx_timeout: Duration) -> Self {
        Self { pool, tx_timeout }
    }
}

fn load_variants(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<VariantSnapshot>, DomainError> {
    let rows: Vec<VariantRow> = product_variants::table
        .inner_join(products::table)
        .filter(product_variants::id.eq_any(ids))
        .select((
            product_variants::id,
            product_variants::sku,
            product_variants::name,
            product_variants::price,
            product_variants::discount_percent,
            product_variants::tax_rate,
            product_variants::is_published,
            product_variants::deleted_at,
            products::is_active,
        ))
        .load(conn)?;
    Ok(rows.into_iter().map(Into::into).collect())
}

fn resolve_address(conn: &mut PgConnection, request: &PlaceOrder) -> Result<AddressFields, DomainError> {
    match &request.address {
        AddressRef::Inline(fields) => Ok(fields.clone()),
        AddressRef::ById(address_id) => {
            let customer_id = request.customer_id.ok_or(DomainError::Unauthorized)?;
            customer_addresses::table
                .filter(customer_addresses::id.eq(*address_id))
                .filter(customer_addresses::customer_id.eq(customer_id))
                .select(CustomerAddressRow::as_select())
                .first(conn)
                .optional()?
                .map(AddressFields::from)
                .ok_or(DomainError::AddressNotFound)
        }
    }
}

/// Counts one redemption; fails if the last use was taken concurrently.
fn redeem(conn: &mut PgConnection, discount_id: Uuid) -> Result<(), DomainError> {
    let updated = diesel::update(
        discount_codes::table
            .filter(discount_codes::id.eq(discount_id))
            .filter(
                discount_codes::max_uses
                    .is_null()
                    .or(discount_codes::times_used.nullable().lt(discount_codes::max_uses)),
            ),
    )
    .set(discount_codes::times_used.eq(discount_codes::times_used + 1))
    .execute(conn)?;

    if updated == 0 {
        return Err(DomainError::DiscountExhausted);
    }
    Ok(())
}

fn insert_order(conn: &mut PgConnection, order: &AssembledOrder) -> Result<Uuid, DomainError> {
    let order_id = Uuid::new_v4();
    diesel::insert_into(orders::table)
        .values(&NewOrderRow {
            id: order_id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            email: order.address.email.clone(),
            status: order.status.as_str().to_string(),
            payment_type: order.payment_type.as_str().to_string(),
            subtotal: order.subtotal.clone(),
            discount_total: order.discount_total.clone(),
            total: order.total.clone(),
            price_at_gateway: order.price_at_gateway().clone(),
            discount_code: order.discount_code.clone(),
        })
        .execute(conn)?;

    diesel::insert_into(order_addresses::table)
        .values(&NewOrderAddressRow::snapshot(order_id, &order.address))
        .execute(conn)?;

    let items: Vec<NewOrderItemRow> = order
        .items
        .iter()
        .map(|item| NewOrderItemRow {
            id: Uuid::new_v4(),
            order_id,
            variant_id: item.variant_id,
            sku: item.sku.clone(),
            name: item.name.clone(),
            unit_price: item.unit_price.clone(),
            discount_percent: item.discount_percent.clone(),
            tax_rate: item.tax_rate.clone(),
            quantity: item.quantity,
            final_price: item.final_price.clone(),
            line_total: item.line_total.clone(),
        })
        .collect();
    diesel::insert_into(order_items::table)
        .values(&items)
        .execute(conn)?;

    Ok(order_id)
}

fn to_view(row: OrderRow, address: Option<AddressFields>, items: Vec<OrderItemRow>) -> Result<OrderView, DomainError> {
    Ok(OrderView {
        id: row.id,
        status: OrderStatus::from_str(&row.status)?,
        payment_type: PaymentType::from_str(&row.payment_type)?,
        order_number: row.order_number,
        customer_id: row.customer_id,
        subtotal: row.subtotal,
        discount_total: row.discount_total,
        total: row.total,
        price_at_gateway: row.price_at_gateway,
        discount_code: row.discount_code,
        gateway_payment_id: row.gateway_payment_id,
        created_at: row.created_at,
        address,
        items: items
            .into_iter()
            .map(|i| OrderItemView {
                variant_id: i.variant_id,
                sku: i.sku,
                name: i.name,
                unit_price: i.unit_price,
                discount_percent: i.discount_percent,
                tax_rate: i.tax_rate,
                quantity: i.quantity,
                final_price: i.final_price,
                line_total: i.line_total,
            })
            .collect(),
    })
}

impl OrderRepository for DieselOrderRepository {
    fn place(&self, request: &PlaceOrder, assembler: &OrderAssembler) -> Result<PlacedOrder, DomainError> {
        let mut conn = self.pool.get()?;
        let started = Instant::now();
        let budget = self.tx_timeout;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::sql_query(format!("SET LOCAL statement_timeout = {}", budget.as_millis()))
                .execute(conn)?;

            let variants = load_variants(conn, &request.variant_ids())?;
            let address = resolve_address(conn, request)?;
            let discount = match &request.discount_code {
                Some(raw) => load_active_discount(conn, &normalize_code(raw))?,
                None => None,
            };

            let order = assembler.assemble(request, address, &variants, discount.as_ref(), Utc::now())?;

            if let Some(discount_id) = order.redeemed_discount_id {
                redeem(conn, discount_id)?;
            }
            let order_id = insert_order(conn, &order)?;

            if started.elapsed() > budget {
                log::warn!(
                    "Order {} exceeded its {}s transaction budget, rolling back",
                    order.order_number,
                    budget.as_secs()
                );
                return Err(DomainError::Timeout);
            }

            Ok(PlacedOrder {
                order_id,
                order_number: order.order_number,
            })
        })
    }

    fn find_by_number(&self, order_number: &str) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::order_number.eq(order_number))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = OrderItemRow::belonging_to(&order)
            .select(OrderItemRow::as_select())
            .order(order_items::sku.asc())
            .load(&mut conn)?;

        let address = OrderAddressRow::belonging_to(&order)
            .select(OrderAddressRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(AddressFields::from);

        to_view(order, address, items).map(Some)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .map(|o| to_view(o, None, vec![]))
                    .collect::<Result<_, _>>()?,
                total,
            })
        })
    }

    fn transition(
        &self,
        order_number: &str,
        transition: StatusTransition,
    ) -> Result<OrderStatus, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let (order_id, status): (Uuid, String) = orders::table
                .filter(orders::order_number.eq(order_number))
                .select((orders::id, orders::status))
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Order"))?;

            let next = OrderStatus::from_str(&status)?.apply(transition)?;
            diesel::update(orders::table.find(order_id))
                .set((
                    orders::status.eq(next.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            log::info!("Order {} {} -> {}", order_number, status, next);
            Ok(next)
        })
    }

    fn confirm_payment(
        &self,
        order_number: &str,
        gateway_payment_id: &str,
    ) -> Result<Confirmation, DomainError> {
        let mut conn = self.pool.get()?;
        let confirmable: Vec<&str> = OrderStatus::CONFIRMABLE.iter().map(|s| s.as_str()).collect();

        let updated = diesel::update(
            orders::table
                .filter(orders::order_number.eq(order_number))
                .filter(orders::status.eq_any(confirmable)),
        )
        .set((
            orders::status.eq(OrderStatus::Paid.as_str()),
            orders::gateway_payment_id.eq(gateway_payment_id),
            orders::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        if updated == 1 {
            return Ok(Confirmation::Confirmed);
        }

        let (status, recorded): (String, Option<String>) = orders::table
            .filter(orders::order_number.eq(order_number))
            .select((orders::status, orders::gateway_payment_id))
            .first(&mut conn)
            .optional()?
            .ok_or(DomainError::NotFound("Order"))?;
        let status = OrderStatus::from_str(&status)?;
        confirmation_of(order_number, status, recorded.as_deref(), gateway_payment_id)
    }

    fn add_bank_transfer_notice(
        &self,
        order_number: &str,
        notice: &BankTransferNotice,
    ) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let order_id: Uuid = orders::table
            .filter(orders::order_number.eq(order_number))
            .select(orders::id)
            .first(&mut conn)
            .optional()?
            .ok_or(DomainError::NotFound("Order"))?;

        let id = Uuid::new_v4();
        diesel::insert_into(bank_transfer_notifications::table)
            .values(&NewBankTransferNotificationRow {
                id,
                order_id,
                sender_name: notice.sender_name.clone(),
                amount: notice.amount.clone(),
                note: notice.note.clone(),
            })
            .execute(&mut conn)?;
        Ok(id)
    }
}
