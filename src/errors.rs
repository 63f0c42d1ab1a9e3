use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// Body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    /// Stable machine-readable code, e.g. `ITEM_UNAVAILABLE`.
    pub code: String,
    /// Whether repeating the same request may succeed.
    pub retryable: bool,
}

impl AppError {
    fn body(&self) -> ErrorBody {
        match self {
            AppError::Domain(DomainError::Internal(_)) | AppError::Internal(_) => ErrorBody {
                success: false,
                message: "Internal server error".to_string(),
                code: "UNKNOWN".to_string(),
                retryable: false,
            },
            AppError::Domain(e) => ErrorBody {
                success: false,
                message: e.to_string(),
                code: e.code().to_string(),
                retryable: e.is_retryable(),
            },
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        let AppError::Domain(e) = self else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match e {
            DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::NotFound(_)
            | DomainError::AddressNotFound
            | DomainError::DiscountNotFound => StatusCode::NOT_FOUND,
            DomainError::InvalidTransition { .. } | DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::ItemUnavailable(_)
            | DomainError::DiscountNotApplicable
            | DomainError::DiscountExhausted => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            DomainError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status).json(self.body())
    }
}
