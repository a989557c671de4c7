use thiserror::Error;

use crate::traits::{CheckoutDbError, GatewayError};

#[derive(Debug, Clone, Error)]
pub enum CheckoutFlowError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("You are not authorized to access this resource")]
    Unauthorized,
    #[error("Cart {0} does not exist")]
    CartNotFound(i64),
    #[error("No payment exists for reference {0}")]
    PaymentNotFound(String),
    #[error("Verification of {0} is already in progress. Try again shortly.")]
    VerificationInProgress(String),
    #[error("Verification did not complete within {0} attempts. Try again shortly.")]
    RetriesExhausted(u32),
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),
    #[error("Payment {0} is settled but its order is missing. This is a data integrity bug.")]
    OrderMissingForSettledPayment(String),
    #[error("Database error: {0}")]
    DatabaseError(CheckoutDbError),
}

impl CheckoutFlowError {
    /// Whether this failure is a lost optimistic race that a fresh reconciliation attempt can win.
    pub fn is_transient(&self) -> bool {
        matches!(self, CheckoutFlowError::DatabaseError(e) if e.is_transient())
    }
}

impl From<CheckoutDbError> for CheckoutFlowError {
    fn from(e: CheckoutDbError) -> Self {
        match e {
            CheckoutDbError::CartNotFound(id) => CheckoutFlowError::CartNotFound(id),
            CheckoutDbError::PaymentNotFound(pidx) => CheckoutFlowError::PaymentNotFound(pidx),
            other => CheckoutFlowError::DatabaseError(other),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Not enough stock of product {0} to satisfy the request")]
    InsufficientStock(i64),
    #[error("Product {0} is not in the cart")]
    ItemNotInCart(i64),
    #[error("There is no open cart for this user")]
    CartNotFound,
    #[error("The cart has a payment in flight and cannot be modified")]
    CartLocked,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<CheckoutDbError> for CartApiError {
    fn from(e: CheckoutDbError) -> Self {
        match e {
            CheckoutDbError::ProductNotFound(id) => CartApiError::ProductNotFound(id),
            CheckoutDbError::InsufficientStock(id) => CartApiError::InsufficientStock(id),
            CheckoutDbError::ItemNotInCart(id) => CartApiError::ItemNotInCart(id),
            CheckoutDbError::NoCurrentCart => CartApiError::CartNotFound,
            CheckoutDbError::IllegalStatusChange(_) => CartApiError::CartLocked,
            other => CartApiError::DatabaseError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<CheckoutDbError> for OrderApiError {
    fn from(e: CheckoutDbError) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
