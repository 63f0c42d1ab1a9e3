use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, ErrorBody};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DiscountCheckRequest {
    pub code: String,
    /// Variants currently in the basket.
    #[serde(default)]
    pub variant_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountCheckResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
    /// `FIXED` or `PERCENTAGE`
    pub discount_type: String,
    /// Currency amount for `FIXED`, percent for `PERCENTAGE`, as a decimal string.
    pub discount_amount: String,
}

/// POST /discounts/check
///
/// Tells the storefront whether a code applies to the basket. Nothing is
/// applied or redeemed.
#[utoipa::path(
    post,
    path = "/discounts/check",
    request_body = DiscountCheckRequest,
    responses(
        (status = 200, description = "Code applies", body = DiscountCheckResponse),
        (status = 404, description = "Unknown or retired code", body = ErrorBody),
        (status = 422, description = "Code does not apply to these items", body = ErrorBody),
    ),
    tag = "discounts"
)]
pub async fn check_discount(
    state: web::Data<AppState>,
    body: web::Json<DiscountCheckRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let check =
        web::block(move || state.discounts.check_discount(&body.code, &body.variant_ids)).await??;

    Ok(HttpResponse::Ok().json(DiscountCheckResponse {
        success: true,
        message: "Discount code applied".to_string(),
        code: check.code,
        discount_type: check.discount_type.to_string(),
        discount_amount: check.discount_amount.to_string(),
    }))
}
