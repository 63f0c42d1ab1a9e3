use std::net::SocketAddr;

use actix_web::http::header::{ContentType, LOCATION};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::payment_service::{CardCheckout, ThreeDsCallback};
use crate::domain::gateway::{PaymentCard, PaymentResult};
use crate::domain::order::Confirmation;
use crate::domain::order_number;
use crate::errors::{AppError, ErrorBody};
use crate::AppState;

use super::require_admin;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Deserialize, ToSchema)]
pub struct CardBody {
    pub holder_name: String,
    pub number: String,
    pub expire_month: String,
    pub expire_year: String,
    pub cvc: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CardPaymentRequest {
    pub order_number: String,
    pub card: CardBody,
    /// National identity number the gateway requires for the buyer.
    pub identity_number: String,
}

/// Fields the gateway posts after the 3-D Secure challenge.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsCallbackForm {
    pub status: String,
    pub payment_id: Option<String>,
    pub conversation_id: String,
    pub conversation_data: Option<String>,
    pub md_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub success: bool,
    pub message: String,
    pub order_number: String,
    pub payment_id: String,
    pub already_confirmed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BinCheckRequest {
    pub bin_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BinCheckResponse {
    pub success: bool,
    pub message: String,
    pub bin_number: String,
    pub card_type: Option<String>,
    pub card_association: Option<String>,
    pub card_family: Option<String>,
    pub bank_name: Option<String>,
    pub commercial: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDetailResponse {
    pub success: bool,
    pub message: String,
    pub payment_id: String,
    pub basket_id: Option<String>,
    pub paid_price: Option<String>,
    pub currency: Option<String>,
    pub fraud_status: Option<i32>,
}

impl From<PaymentResult> for PaymentDetailResponse {
    fn from(r: PaymentResult) -> Self {
        PaymentDetailResponse {
            success: true,
            message: "OK".to_string(),
            payment_id: r.payment_id,
            basket_id: r.basket_id,
            paid_price: r.paid_price.map(|p| p.to_string()),
            currency: r.currency,
            fraud_status: r.fraud_status,
        }
    }
}

fn client_ip(req: &HttpRequest) -> String {
    let info = req.connection_info();
    let addr = info.realip_remote_addr().unwrap_or("127.0.0.1");
    addr.parse::<SocketAddr>()
        .map(|a| a.ip().to_string())
        .unwrap_or_else(|_| addr.to_string())
}

fn checkout(body: CardPaymentRequest, req: &HttpRequest) -> CardCheckout {
    CardCheckout {
        order_number: body.order_number,
        card: PaymentCard {
            holder_name: body.card.holder_name,
            number: body.card.number,
            expire_month: body.card.expire_month,
            expire_year: body.card.expire_year,
            cvc: body.card.cvc,
        },
        identity_number: body.identity_number,
        ip: client_ip(req),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /payments/3ds/initialize
///
/// Returns the bank's auto-submitting challenge page as `text/html`,
/// unmodified.
#[utoipa::path(
    post,
    path = "/payments/3ds/initialize",
    request_body = CardPaymentRequest,
    responses(
        (status = 200, description = "Challenge page", content_type = "text/html", body = String),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 409, description = "Order is not awaiting a card payment", body = ErrorBody),
        (status = 502, description = "Gateway declined", body = ErrorBody),
        (status = 503, description = "Gateway unreachable", body = ErrorBody),
    ),
    tag = "payments"
)]
pub async fn initialize_three_ds(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CardPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let html = state
        .payments
        .start_three_ds(checkout(body.into_inner(), &req))
        .await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(html))
}

/// POST /payments/3ds/callback
///
/// The gateway's form post after the challenge. Always answers with a
/// redirect back to the storefront.
#[utoipa::path(
    post,
    path = "/payments/3ds/callback",
    request_body(content = ThreeDsCallbackForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the order page, with `?payment=failed` on failure"),
    ),
    tag = "payments"
)]
pub async fn three_ds_callback(
    state: web::Data<AppState>,
    form: web::Form<ThreeDsCallbackForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let order_number = form.conversation_id.clone();
    let order_page = if order_number::is_well_formed(&order_number) {
        format!("{}/orders/{}", state.storefront_url, order_number)
    } else {
        format!("{}/", state.storefront_url)
    };

    let outcome = state
        .payments
        .complete_three_ds(ThreeDsCallback {
            status: form.status,
            payment_id: form.payment_id,
            conversation_id: form.conversation_id,
            conversation_data: form.conversation_data,
            md_status: form.md_status,
        })
        .await;

    let location = match outcome {
        Ok(outcome) => {
            log::info!(
                "Order {} paid with payment {} ({:?})",
                outcome.order_number,
                outcome.payment_id,
                outcome.confirmation
            );
            order_page
        }
        Err(e) => {
            log::warn!("3DS callback for order {} failed: {}", order_number, e);
            format!("{order_page}?payment=failed")
        }
    };

    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// POST /payments/direct
///
/// Charges the card without a 3-D Secure challenge.
#[utoipa::path(
    post,
    path = "/payments/direct",
    request_body = CardPaymentRequest,
    responses(
        (status = 200, description = "Payment captured and order confirmed", body = PaymentResponse),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 502, description = "Gateway declined", body = ErrorBody),
        (status = 503, description = "Gateway unreachable", body = ErrorBody),
    ),
    tag = "payments"
)]
pub async fn pay_direct(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CardPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .payments
        .pay_direct(checkout(body.into_inner(), &req))
        .await?;

    Ok(HttpResponse::Ok().json(PaymentResponse {
        success: true,
        message: "Payment received".to_string(),
        order_number: outcome.order_number,
        payment_id: outcome.payment_id,
        already_confirmed: outcome.confirmation == Confirmation::AlreadyConfirmed,
    }))
}

/// POST /payments/bin-check
///
/// Looks up the issuing bank and card family for the first digits of a card.
#[utoipa::path(
    post,
    path = "/payments/bin-check",
    request_body = BinCheckRequest,
    responses(
        (status = 200, description = "Card details", body = BinCheckResponse),
        (status = 400, description = "Malformed BIN", body = ErrorBody),
        (status = 502, description = "Gateway declined", body = ErrorBody),
    ),
    tag = "payments"
)]
pub async fn check_bin(
    state: web::Data<AppState>,
    body: web::Json<BinCheckRequest>,
) -> Result<HttpResponse, AppError> {
    let info = state.payments.check_bin(&body.bin_number).await?;

    Ok(HttpResponse::Ok().json(BinCheckResponse {
        success: true,
        message: "OK".to_string(),
        bin_number: info.bin_number,
        card_type: info.card_type,
        card_association: info.card_association,
        card_family: info.card_family,
        bank_name: info.bank_name,
        commercial: info.commercial,
    }))
}

/// GET /payments/{payment_id}
#[utoipa::path(
    get,
    path = "/payments/{payment_id}",
    params(("payment_id" = String, Path, description = "Gateway payment id")),
    responses(
        (status = 200, description = "Payment as recorded by the gateway", body = PaymentDetailResponse),
        (status = 401, description = "Missing or wrong admin token", body = ErrorBody),
        (status = 502, description = "Gateway declined", body = ErrorBody),
    ),
    security(("admin_token" = [])),
    tag = "payments"
)]
pub async fn payment_detail(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &state)?;
    let detail = state.payments.payment_detail(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PaymentDetailResponse::from(detail)))
}
