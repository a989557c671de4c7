use thiserror::Error;

use crate::{
    db_types::{Cart, NewPaymentIntent, OrderSnapshot, Payment},
    traits::{data_objects::ReconcileOutcome, GatewayLookup},
};

/// This trait defines the transactional behaviour backends must provide for the checkout flow: persisting payment
/// intents and reconciling gateway lookup results into local payment, cart and order state.
///
/// The two write operations are atomic units: either every record they touch is updated, or none is. Backends signal
/// lost optimistic races with [`CheckoutDbError::TransientConflict`] so that callers can retry the whole unit.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase {
    /// The URL of the database
    fn url(&self) -> &str;

    async fn fetch_cart(&self, cart_id: i64) -> Result<Option<Cart>, CheckoutDbError>;

    async fn fetch_payment_by_pidx(&self, pidx: &str) -> Result<Option<Payment>, CheckoutDbError>;

    /// The open payment intent for the cart, if one exists. At most one can exist at a time; the store enforces this
    /// with a uniqueness constraint.
    async fn fetch_pending_payment_for_cart(&self, cart_id: i64) -> Result<Option<Payment>, CheckoutDbError>;

    /// Atomically stores a new pending payment and moves its cart to `Pending`.
    ///
    /// If another intent for the cart won a race and committed first, the uniqueness constraint on open payments
    /// rejects this one with [`CheckoutDbError::UniqueViolation`]; callers recover by fetching the winner.
    async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<Payment, CheckoutDbError>;

    /// The order materialized from the given cart, if any. There can never be more than one.
    async fn fetch_order_for_cart(&self, cart_id: i64) -> Result<Option<OrderSnapshot>, CheckoutDbError>;

    /// Applies one gateway lookup result to local state in a single transaction.
    ///
    /// The payment and its cart are re-read inside the transaction, so the transition is always applied to the latest
    /// committed state:
    /// * payment already settled → returns the existing order, no mutation;
    /// * gateway reports `Completed` → order created (or adopted, if a concurrent attempt created it first), payment
    ///   stamped with the transaction id and completion time, cart moved to `Purchased`;
    /// * gateway reports `Pending` → no mutation;
    /// * anything else → payment marked `Failed`, cart reverted to `Active`.
    async fn reconcile_payment(&self, pidx: &str, lookup: &GatewayLookup) -> Result<ReconcileOutcome, CheckoutDbError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CheckoutDbError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutDbError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The transaction lost a transient conflict and may succeed if retried: {0}")]
    TransientConflict(String),
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),
    #[error("Cart {0} does not exist")]
    CartNotFound(i64),
    #[error("User has no open cart")]
    NoCurrentCart,
    #[error("No payment exists for reference {0}")]
    PaymentNotFound(String),
    #[error("No order exists for cart {0}")]
    OrderNotFound(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Not enough stock of product {0} to satisfy the request")]
    InsufficientStock(i64),
    #[error("Product {0} is not in the cart")]
    ItemNotInCart(i64),
    #[error("Illegal status change: {0}")]
    IllegalStatusChange(String),
}

impl CheckoutDbError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CheckoutDbError::TransientConflict(_))
    }
}

/// SQLite reports lost write races as BUSY/LOCKED rather than as serialization failures; both mean "roll back and try
/// the whole unit again".
const SQLITE_BUSY_CODES: [&str; 4] = ["5", "6", "261", "517"];

impl From<sqlx::Error> for CheckoutDbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => {
                let code = db.code();
                if db.is_unique_violation() {
                    CheckoutDbError::UniqueViolation(db.to_string())
                } else if code.as_deref().map(|c| SQLITE_BUSY_CODES.contains(&c)).unwrap_or(false)
                    || db.message().contains("database is locked")
                {
                    CheckoutDbError::TransientConflict(db.to_string())
                } else {
                    CheckoutDbError::DatabaseError(e.to_string())
                }
            },
            sqlx::Error::PoolTimedOut => CheckoutDbError::TransientConflict(e.to_string()),
            _ => CheckoutDbError::DatabaseError(e.to_string()),
        }
    }
}
