use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use commission_engine::{CommissionGatewayError, MerchantApiError, PayoutError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Invalid merchant data. {0}")]
    ValidationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Order conversion error. {0}")]
    OrderConversionError(#[from] OrderConversionError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::OrderConversionError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Error)]
#[error("Could not convert the webhook payload into an order. {0}.")]
pub struct OrderConversionError(pub String);

impl From<MerchantApiError> for ServerError {
    fn from(e: MerchantApiError) -> Self {
        match e {
            MerchantApiError::ValidationError(v) => Self::ValidationError(v.to_string()),
            MerchantApiError::UserNotFound(id) => Self::NoRecordFound(format!("User {id}")),
            MerchantApiError::MerchantRecordMissing(id) => Self::NoRecordFound(format!("Merchant for user {id}")),
            MerchantApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<PayoutError> for ServerError {
    fn from(e: PayoutError) -> Self {
        match e {
            PayoutError::AffiliateNotFound(id) => Self::NoRecordFound(format!("Affiliate {id}")),
            PayoutError::OrderIdNotFound(id) => Self::NoRecordFound(format!("Order {id}")),
            // Losing the payout race means someone else already settled; report it as a conflict on the backend
            PayoutError::AlreadyPaid(id) => Self::BackendError(format!("Order {id} was already paid out")),
            PayoutError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CommissionGatewayError> for ServerError {
    fn from(e: CommissionGatewayError) -> Self {
        Self::BackendError(e.to_string())
    }
}
