use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error body handed to the out-of-crate HTTP layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Numeric HTTP status
    pub status: u16,
    /// Status category (e.g. "Not Found", "Conflict")
    pub error: String,
    /// Human-readable description, scrubbed of internals
    pub message: String,
    /// RFC 3339 timestamp of the failure
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    ValidationError(String),

    /// A customer sale would push on-hand stock below zero.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// Repayment larger than the credit's remaining balance.
    #[error("overpayment: {0}")]
    Overpayment(String),

    /// Repayment against a credit that is already settled.
    #[error("credit already settled: {0}")]
    AlreadyPaid(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing reference data (seeded lookup rows). Fatal to the enclosing
    /// transaction; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("event dispatch error: {0}")]
    EventError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for the error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock(_) | Self::Overpayment(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::AlreadyPaid(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Configuration(_)
            | Self::DatabaseError(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for clients. Variants that carry caller mistakes
    /// pass their text through; everything else is scrubbed.
    pub fn response_message(&self) -> String {
        match self {
            Self::NotFound(_)
            | Self::ValidationError(_)
            | Self::InsufficientStock(_)
            | Self::Overpayment(_)
            | Self::AlreadyPaid(_)
            | Self::Conflict(_) => self.to_string(),
            Self::DatabaseError(_) => "database error".to_string(),
            Self::Configuration(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::not_found(ServiceError::NotFound("sale".into()), StatusCode::NOT_FOUND)]
    #[case::validation(ServiceError::ValidationError("bad line".into()), StatusCode::BAD_REQUEST)]
    #[case::stock(
        ServiceError::InsufficientStock("SKU-1".into()),
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case::overpayment(
        ServiceError::Overpayment("amount".into()),
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case::already_paid(ServiceError::AlreadyPaid("credit".into()), StatusCode::CONFLICT)]
    #[case::conflict(ServiceError::Conflict("usage limit".into()), StatusCode::CONFLICT)]
    #[case::configuration(
        ServiceError::Configuration("seed row".into()),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn status_codes(#[case] err: ServiceError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn internal_detail_stays_out_of_responses() {
        let hidden =
            ServiceError::Configuration("movement type 'customer_sale' is not seeded".into());
        assert_eq!(hidden.response_message(), "internal server error");

        let visible = ServiceError::Overpayment("amount exceeds remaining balance".into());
        assert_eq!(
            visible.response_message(),
            "overpayment: amount exceeds remaining balance"
        );
    }
}
