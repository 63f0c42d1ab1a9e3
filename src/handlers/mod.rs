pub mod cart;
pub mod discounts;
pub mod orders;
pub mod payments;

use actix_web::{web, HttpRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::errors::{AppError, ErrorBody};
use crate::AppState;

pub const CUSTOMER_HEADER: &str = "X-Customer-Id";

#[derive(OpenApi)]
#[openapi(
    paths(
        discounts::check_discount,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::confirm_order,
        orders::cancel_order,
        orders::refund_order,
        orders::submit_bank_transfer_notification,
        payments::initialize_three_ds,
        payments::three_ds_callback,
        payments::pay_direct,
        payments::check_bin,
        payments::payment_detail,
        cart::get_cart,
        cart::clear_cart,
        cart::add_item,
        cart::remove_item,
        cart::increase_item,
        cart::decrease_item,
        cart::checkout,
    ),
    components(schemas(ErrorBody)),
    modifiers(&AdminAuth),
    tags(
        (name = "orders", description = "Checkout and order lifecycle"),
        (name = "discounts", description = "Discount code lookup"),
        (name = "payments", description = "Card payments through the gateway"),
        (name = "cart", description = "Session carts"),
    )
)]
pub struct ApiDoc;

struct AdminAuth;

impl Modify for AdminAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Malformed JSON bodies get the same envelope as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::from(DomainError::InvalidInput(err.to_string())).into()
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Admin routes take `Authorization: Bearer <ADMIN_API_TOKEN>`.
pub(crate) fn require_admin(req: &HttpRequest, state: &AppState) -> Result<(), AppError> {
    let presented = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if constant_time_eq(token.as_bytes(), state.admin_token.as_bytes()) => Ok(()),
        _ => Err(DomainError::Unauthorized.into()),
    }
}

/// The signed-in customer, if the storefront forwarded one.
pub(crate) fn customer_id(req: &HttpRequest) -> Result<Option<Uuid>, AppError> {
    let Some(raw) = req.headers().get(CUSTOMER_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(Some)
        .ok_or_else(|| DomainError::InvalidInput(format!("{CUSTOMER_HEADER} must be a UUID")).into())
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn token_comparison() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
        assert!(!constant_time_eq(b"s3cret", b"s3cre"));
        assert!(!constant_time_eq(b"s3cret", b"s3creT"));
    }

    #[test]
    fn customer_header_must_be_a_uuid() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((CUSTOMER_HEADER, id.to_string()))
            .to_http_request();
        assert_eq!(customer_id(&req).unwrap(), Some(id));

        let req = TestRequest::default()
            .insert_header((CUSTOMER_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(customer_id(&req).is_err());

        assert_eq!(customer_id(&TestRequest::default().to_http_request()).unwrap(), None);
    }

    #[test]
    fn openapi_lists_checkout_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/orders"));
        assert!(doc.paths.paths.contains_key("/payments/3ds/callback"));
        assert!(doc.paths.paths.contains_key("/cart/{session}/checkout"));
    }
}
