use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::HttpError,
    models::ordermodel::OrderStatus,
    service::{media::MediaError, mpesa::MpesaError},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Order {0} not found")]
    OrderNotFound(Uuid),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Not enough stock for {name}. Available: {available}")]
    InsufficientStock { name: String, available: i32 },

    #[error("Order is {from:?} and cannot move to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order {0} needs an uploaded prescription before it can be approved")]
    PrescriptionMissing(Uuid),

    #[error("You are not allowed to access order {0}")]
    OrderAccessDenied(Uuid),

    #[error("Order already paid")]
    OrderAlreadyPaid,

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] MpesaError),

    #[error("Media upload failed: {0}")]
    Media(#[from] MediaError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::OrderNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::ProductNotFound(_)
            | ServiceError::InsufficientStock { .. }
            | ServiceError::InvalidTransition { .. }
            | ServiceError::PrescriptionMissing(_)
            | ServiceError::OrderAlreadyPaid
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::OrderAccessDenied(_) => StatusCode::FORBIDDEN,

            ServiceError::Gateway(_) | ServiceError::Media(_) => StatusCode::BAD_GATEWAY,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        HttpError::new(error.to_string(), error.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let missing: HttpError = ServiceError::OrderNotFound(Uuid::new_v4()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let stock: HttpError = ServiceError::InsufficientStock {
            name: "Amoxil".to_string(),
            available: 1,
        }
        .into();
        assert_eq!(stock.status, StatusCode::BAD_REQUEST);
        assert_eq!(stock.message, "Not enough stock for Amoxil. Available: 1");

        let denied: HttpError = ServiceError::OrderAccessDenied(Uuid::new_v4()).into();
        assert_eq!(denied.status, StatusCode::FORBIDDEN);

        let gateway: HttpError = ServiceError::Gateway(MpesaError::Rejected("1032".into())).into();
        assert_eq!(gateway.status, StatusCode::BAD_GATEWAY);
    }
}
