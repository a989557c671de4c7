use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use kirana_payment_engine::{CartApiError, CheckoutFlowError, OrderApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Auth token signature invalid or not provided")]
    CouldNotDeserializeAuthToken,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    Conflict(String),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnavailable(String),
    #[error("The server is busy. {0}")]
    TryAgainLater(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializeAuthToken => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::TryAgainLater(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "message": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Auth token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Auth token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<CheckoutFlowError> for ServerError {
    fn from(e: CheckoutFlowError) -> Self {
        match e {
            CheckoutFlowError::ValidationError(m) => Self::ValidationError(m),
            CheckoutFlowError::Unauthorized => Self::InsufficientPermissions(e.to_string()),
            CheckoutFlowError::CartNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutFlowError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutFlowError::VerificationInProgress(_) => Self::Conflict(e.to_string()),
            CheckoutFlowError::RetriesExhausted(_) => Self::TryAgainLater(e.to_string()),
            CheckoutFlowError::GatewayError(g) => Self::GatewayUnavailable(g.to_string()),
            CheckoutFlowError::OrderMissingForSettledPayment(_) => Self::BackendError(e.to_string()),
            CheckoutFlowError::DatabaseError(d) => Self::BackendError(d.to_string()),
        }
    }
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::ValidationError(m) => Self::ValidationError(m),
            CartApiError::InsufficientStock(_) => Self::ValidationError(e.to_string()),
            CartApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CartApiError::ItemNotInCart(_) => Self::NoRecordFound(e.to_string()),
            CartApiError::CartNotFound => Self::NoRecordFound(e.to_string()),
            CartApiError::CartLocked => Self::Conflict(e.to_string()),
            CartApiError::DatabaseError(m) => Self::BackendError(m),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(m) => Self::BackendError(m),
        }
    }
}
