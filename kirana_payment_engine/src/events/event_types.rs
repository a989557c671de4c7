use serde::{Deserialize, Serialize};

use crate::db_types::{OrderSnapshot, Payment};

/// Fired when verification settles a payment and an order stands for its cart.
///
/// Delivery is at-least-once: a reconciliation race that is resolved by adopting a concurrently created order can
/// fire the event again for the same order. Subscribers that trigger external side effects (confirmation mail,
/// fulfilment) should de-duplicate on the order id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: OrderSnapshot,
}

impl OrderPaidEvent {
    pub fn new(order: OrderSnapshot) -> Self {
        Self { order }
    }
}

/// Fired when the gateway reports a terminal non-success and the cart is reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDeclinedEvent {
    pub payment: Payment,
}

impl PaymentDeclinedEvent {
    pub fn new(payment: Payment) -> Self {
        Self { payment }
    }
}
