use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::errors::{AppError, ErrorBody};
use crate::AppState;

use super::customer_id;
use super::orders::{place_order_request, AddressRequest, OrderPlacedResponse, PaymentTypeDto};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub variant_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub success: bool,
    pub message: String,
    pub items: Vec<CartLineResponse>,
    pub item_count: i32,
}

impl CartResponse {
    fn new(message: &str, cart: &Cart) -> Self {
        CartResponse {
            success: true,
            message: message.to_string(),
            items: cart
                .lines()
                .iter()
                .map(|l| CartLineResponse {
                    variant_id: l.variant_id,
                    quantity: l.quantity,
                })
                .collect(),
            item_count: cart.item_count(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartCheckoutRequest {
    pub address: AddressRequest,
    pub discount_code: Option<String>,
    pub payment_type: PaymentTypeDto,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart/{session}
#[utoipa::path(
    get,
    path = "/cart/{session}",
    params(("session" = String, Path, description = "Storefront session id")),
    responses(
        (status = 200, description = "Current cart, empty for unknown sessions", body = CartResponse),
        (status = 400, description = "Malformed session id", body = ErrorBody),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let cart = state.carts.get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(CartResponse::new("OK", &cart)))
}

/// DELETE /cart/{session}
#[utoipa::path(
    delete,
    path = "/cart/{session}",
    params(("session" = String, Path, description = "Storefront session id")),
    responses(
        (status = 200, description = "Cart emptied", body = CartResponse),
        (status = 400, description = "Malformed session id", body = ErrorBody),
    ),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.carts.clear(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(CartResponse::new("Cart cleared", &Cart::default())))
}

/// POST /cart/{session}/items
///
/// Adds to an existing line for the same variant rather than creating a
/// second one. Prices are not looked up until checkout.
#[utoipa::path(
    post,
    path = "/cart/{session}/items",
    params(("session" = String, Path, description = "Storefront session id")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added", body = CartResponse),
        (status = 400, description = "Bad quantity or cart full", body = ErrorBody),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let cart = state
        .carts
        .update(&path.into_inner(), |cart| cart.add(body.variant_id, body.quantity))?;
    Ok(HttpResponse::Ok().json(CartResponse::new("Item added", &cart)))
}

/// DELETE /cart/{session}/items/{variant_id}
#[utoipa::path(
    delete,
    path = "/cart/{session}/items/{variant_id}",
    params(
        ("session" = String, Path, description = "Storefront session id"),
        ("variant_id" = Uuid, Path, description = "Variant to drop"),
    ),
    responses(
        (status = 200, description = "Item removed", body = CartResponse),
        (status = 404, description = "Variant not in cart", body = ErrorBody),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (session, variant_id) = path.into_inner();
    let cart = state.carts.update(&session, |cart| cart.remove(variant_id))?;
    Ok(HttpResponse::Ok().json(CartResponse::new("Item removed", &cart)))
}

/// POST /cart/{session}/items/{variant_id}/increase
#[utoipa::path(
    post,
    path = "/cart/{session}/items/{variant_id}/increase",
    params(
        ("session" = String, Path, description = "Storefront session id"),
        ("variant_id" = Uuid, Path, description = "Variant in the cart"),
    ),
    responses(
        (status = 200, description = "Quantity increased", body = CartResponse),
        (status = 400, description = "Already at the maximum quantity", body = ErrorBody),
        (status = 404, description = "Variant not in cart", body = ErrorBody),
    ),
    tag = "cart"
)]
pub async fn increase_item(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (session, variant_id) = path.into_inner();
    let cart = state.carts.update(&session, |cart| cart.increase(variant_id))?;
    Ok(HttpResponse::Ok().json(CartResponse::new("Quantity updated", &cart)))
}

/// POST /cart/{session}/items/{variant_id}/decrease
///
/// Taking the last unit away removes the line.
#[utoipa::path(
    post,
    path = "/cart/{session}/items/{variant_id}/decrease",
    params(
        ("session" = String, Path, description = "Storefront session id"),
        ("variant_id" = Uuid, Path, description = "Variant in the cart"),
    ),
    responses(
        (status = 200, description = "Quantity decreased", body = CartResponse),
        (status = 404, description = "Variant not in cart", body = ErrorBody),
    ),
    tag = "cart"
)]
pub async fn decrease_item(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (session, variant_id) = path.into_inner();
    let cart = state.carts.update(&session, |cart| cart.decrease(variant_id))?;
    Ok(HttpResponse::Ok().json(CartResponse::new("Quantity updated", &cart)))
}

/// POST /cart/{session}/checkout
///
/// Places an order for the cart's contents. The cart is emptied only once
/// the order exists, and only if nothing was added meanwhile.
#[utoipa::path(
    post,
    path = "/cart/{session}/checkout",
    params(
        ("session" = String, Path, description = "Storefront session id"),
        ("X-Customer-Id" = Option<Uuid>, Header, description = "Signed-in customer"),
    ),
    request_body = CartCheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderPlacedResponse),
        (status = 400, description = "Empty cart or invalid request", body = ErrorBody),
        (status = 404, description = "Address or discount code not found", body = ErrorBody),
        (status = 422, description = "Item unavailable or discount not applicable", body = ErrorBody),
    ),
    tag = "cart"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CartCheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let session = path.into_inner();
    let body = body.into_inner();
    let cart = state.carts.get(&session)?;
    if cart.is_empty() {
        return Err(DomainError::InvalidInput("cart is empty".into()).into());
    }

    let request = place_order_request(
        customer_id(&req)?,
        body.address,
        cart.to_order_items(),
        body.discount_code,
        body.payment_type,
    );
    let orders = state.clone();
    let placed = web::block(move || orders.orders.create_order(request)).await??;

    if !state.carts.clear_if_unchanged(&session, &cart)? {
        log::info!(
            "Cart {} changed during checkout of order {}; keeping it",
            session,
            placed.order_number
        );
    }

    Ok(HttpResponse::Created().json(OrderPlacedResponse {
        success: true,
        message: "Order placed".to_string(),
        order_number: placed.order_number,
    }))
}
