use std::str::FromStr;

use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    AddressFields, AddressRef, BankTransferNotice, OrderItemInput, OrderView, PaymentType,
    PlaceOrder, StatusTransition,
};
use crate::errors::{AppError, ErrorBody};
use crate::AppState;

use super::{customer_id, require_admin};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AddressBody {
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

impl From<AddressBody> for AddressFields {
    fn from(a: AddressBody) -> Self {
        AddressFields {
            full_name: a.full_name,
            email: a.email,
            phone: a.phone,
            line1: a.line1,
            line2: a.line2,
            city: a.city,
            district: a.district,
            postal_code: a.postal_code,
            country: a.country,
        }
    }
}

impl From<AddressFields> for AddressBody {
    fn from(a: AddressFields) -> Self {
        AddressBody {
            full_name: a.full_name,
            email: a.email,
            phone: a.phone,
            line1: a.line1,
            line2: a.line2,
            city: a.city,
            district: a.district,
            postal_code: a.postal_code,
            country: a.country,
        }
    }
}

/// Either `{"saved_address_id": "<uuid>"}` or `{"inline": {...}}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddressRequest {
    SavedAddressId(Uuid),
    Inline(AddressBody),
}

impl From<AddressRequest> for AddressRef {
    fn from(a: AddressRequest) -> Self {
        match a {
            AddressRequest::SavedAddressId(id) => AddressRef::ById(id),
            AddressRequest::Inline(body) => AddressRef::Inline(body.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentTypeDto {
    Card,
    BankTransfer,
}

impl From<PaymentTypeDto> for PaymentType {
    fn from(p: PaymentTypeDto) -> Self {
        match p {
            PaymentTypeDto::Card => PaymentType::Card,
            PaymentTypeDto::BankTransfer => PaymentType::BankTransfer,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub address: AddressRequest,
    pub items: Vec<OrderItemRequest>,
    pub discount_code: Option<String>,
    pub payment_type: PaymentTypeDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPlacedResponse {
    pub success: bool,
    pub message: String,
    pub order_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub variant_id: Uuid,
    pub sku: String,
    pub name: String,
    /// Decimal amounts are strings to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub discount_percent: String,
    pub tax_rate: String,
    pub quantity: i32,
    pub final_price: String,
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub status: String,
    pub payment_type: String,
    pub subtotal: String,
    pub discount_total: String,
    pub total: String,
    pub discount_code: Option<String>,
    pub created_at: String,
    pub address: Option<AddressBody>,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            order_number: o.order_number,
            customer_id: o.customer_id,
            status: o.status.to_string(),
            payment_type: o.payment_type.as_str().to_string(),
            subtotal: o.subtotal.to_string(),
            discount_total: o.discount_total.to_string(),
            total: o.total.to_string(),
            discount_code: o.discount_code,
            created_at: o.created_at.to_rfc3339(),
            address: o.address.map(Into::into),
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    variant_id: i.variant_id,
                    sku: i.sku,
                    name: i.name,
                    unit_price: i.unit_price.to_string(),
                    discount_percent: i.discount_percent.to_string(),
                    tax_rate: i.tax_rate.to_string(),
                    quantity: i.quantity,
                    final_price: i.final_price.to_string(),
                    line_total: i.line_total.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEnvelope {
    pub success: bool,
    pub message: String,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChangeResponse {
    pub success: bool,
    pub message: String,
    pub order_number: String,
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BankTransferNotificationRequest {
    pub sender_name: String,
    /// Decimal amount as a string, e.g. "108.00"
    pub amount: String,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub success: bool,
    pub message: String,
    pub notification_id: Uuid,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub success: bool,
    pub message: String,
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// Builds the domain request; shared with the cart checkout.
pub(crate) fn place_order_request(
    customer_id: Option<Uuid>,
    address: AddressRequest,
    items: Vec<OrderItemInput>,
    discount_code: Option<String>,
    payment_type: PaymentTypeDto,
) -> PlaceOrder {
    PlaceOrder {
        customer_id,
        address: address.into(),
        items,
        discount_code,
        payment_type: payment_type.into(),
    }
}

/// POST /orders
///
/// Prices the basket from the catalog and writes the order, its address
/// snapshot and its items in one transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    params(
        ("X-Customer-Id" = Option<Uuid>, Header, description = "Signed-in customer"),
    ),
    responses(
        (status = 201, description = "Order placed", body = OrderPlacedResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Saved address used without a customer", body = ErrorBody),
        (status = 404, description = "Address or discount code not found", body = ErrorBody),
        (status = 422, description = "Item unavailable or discount not applicable", body = ErrorBody),
        (status = 504, description = "Transaction timed out", body = ErrorBody),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = place_order_request(
        customer_id(&req)?,
        body.address,
        body.items
            .into_iter()
            .map(|i| OrderItemInput {
                variant_id: i.variant_id,
                quantity: i.quantity,
            })
            .collect(),
        body.discount_code,
        body.payment_type,
    );

    let placed = web::block(move || state.orders.create_order(request)).await??;

    Ok(HttpResponse::Created().json(OrderPlacedResponse {
        success: true,
        message: "Order placed".to_string(),
        order_number: placed.order_number,
    }))
}

/// GET /orders/{order_number}
///
/// Returns the order together with its items and address snapshot.
#[utoipa::path(
    get,
    path = "/orders/{order_number}",
    params(
        ("order_number" = String, Path, description = "Order number, e.g. ORD-240517-3F9A0C11D2"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderEnvelope),
        (status = 404, description = "Order not found", body = ErrorBody),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_number = path.into_inner();
    let order = web::block(move || state.orders.get_order(&order_number)).await??;

    Ok(HttpResponse::Ok().json(OrderEnvelope {
        success: true,
        message: "OK".to_string(),
        order: order.into(),
    }))
}

/// GET /orders
///
/// Returns a paginated list of orders (without their items), newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing or wrong admin token", body = ErrorBody),
    ),
    security(("admin_token" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &state)?;
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || state.orders.list_orders(page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        success: true,
        message: "OK".to_string(),
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        limit,
    }))
}

async fn change_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    order_number: String,
    transition: StatusTransition,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &state)?;
    let number = order_number.clone();
    let status = web::block(move || state.orders.transition(&number, transition)).await??;

    Ok(HttpResponse::Ok().json(StatusChangeResponse {
        success: true,
        message: format!("Order is now {}", status),
        order_number,
        status: status.to_string(),
    }))
}

/// POST /orders/{order_number}/confirm
///
/// Marks a pending card order or an awaiting bank transfer as paid.
#[utoipa::path(
    post,
    path = "/orders/{order_number}/confirm",
    params(("order_number" = String, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order confirmed", body = StatusChangeResponse),
        (status = 401, description = "Missing or wrong admin token", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 409, description = "Order cannot be confirmed in its state", body = ErrorBody),
    ),
    security(("admin_token" = [])),
    tag = "orders"
)]
pub async fn confirm_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    change_status(state, req, path.into_inner(), StatusTransition::Confirm).await
}

/// POST /orders/{order_number}/cancel
#[utoipa::path(
    post,
    path = "/orders/{order_number}/cancel",
    params(("order_number" = String, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order cancelled", body = StatusChangeResponse),
        (status = 401, description = "Missing or wrong admin token", body = ErrorBody),
        (status = 409, description = "Order cannot be cancelled in its state", body = ErrorBody),
    ),
    security(("admin_token" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    change_status(state, req, path.into_inner(), StatusTransition::Cancel).await
}

/// POST /orders/{order_number}/refund
#[utoipa::path(
    post,
    path = "/orders/{order_number}/refund",
    params(("order_number" = String, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order refunded", body = StatusChangeResponse),
        (status = 401, description = "Missing or wrong admin token", body = ErrorBody),
        (status = 409, description = "Only paid orders can be refunded", body = ErrorBody),
    ),
    security(("admin_token" = [])),
    tag = "orders"
)]
pub async fn refund_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    change_status(state, req, path.into_inner(), StatusTransition::Refund).await
}

/// POST /orders/{order_number}/bank-transfer-notifications
///
/// A customer reports having wired the money. The order stays
/// `AWAITING_TRANSFER` until an admin confirms it.
#[utoipa::path(
    post,
    path = "/orders/{order_number}/bank-transfer-notifications",
    params(("order_number" = String, Path, description = "Order number")),
    request_body = BankTransferNotificationRequest,
    responses(
        (status = 201, description = "Notification recorded", body = NotificationResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 409, description = "Order does not await a transfer", body = ErrorBody),
    ),
    tag = "orders"
)]
pub async fn submit_bank_transfer_notification(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<BankTransferNotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let order_number = path.into_inner();
    let body = body.into_inner();
    let amount = BigDecimal::from_str(body.amount.trim()).map_err(|_| {
        DomainError::InvalidInput(format!("Invalid amount '{}'", body.amount))
    })?;
    let notice = BankTransferNotice {
        sender_name: body.sender_name,
        amount,
        note: body.note.filter(|n| !n.trim().is_empty()),
    };

    let id = web::block(move || state.orders.submit_bank_transfer_notice(&order_number, notice))
        .await??;

    Ok(HttpResponse::Created().json(NotificationResponse {
        success: true,
        message: "Transfer notification received".to_string(),
        notification_id: id,
    }))
}
