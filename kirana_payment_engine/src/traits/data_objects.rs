use crate::db_types::{Order, OrderSnapshot, Payment};

/// The result of one reconciliation transaction.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// The payment is settled and exactly one order exists for its cart. Returned both when this transaction created
    /// the order and when it adopted one created by a concurrent attempt.
    Settled { payment: Payment, order: OrderSnapshot },
    /// The gateway has not reached a terminal state; nothing was changed.
    StillPending { payment: Payment },
    /// The gateway reported a terminal non-success; the payment is `Failed` and the cart is open again.
    Declined { payment: Payment },
}

/// Outcome of an order insert under the one-order-per-cart uniqueness constraint. Losing the insert race is an
/// expected result, not an error.
#[derive(Debug, Clone)]
pub enum InsertOrderOutcome {
    Inserted(Order),
    AlreadyExists(Order),
}
