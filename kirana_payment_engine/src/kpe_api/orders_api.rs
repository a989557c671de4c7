use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{OrderSnapshot, UserId},
    kpe_api::errors::OrderApiError,
    traits::OrderManagement,
};

/// Read access to materialized orders.
pub struct OrderApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi ({:?})", self.db)
    }
}

impl<B> OrderApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's purchase history, newest first.
    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderSnapshot>, OrderApiError> {
        let orders = self.db.orders_for_user(user_id).await?;
        trace!("🧾️ Fetched {} order(s) for user {user_id}", orders.len());
        Ok(orders)
    }

    /// Fetches one order, but only if it belongs to `user_id`. Orders belonging to other users are reported as
    /// absent rather than as forbidden, so the endpoint does not leak which order ids exist.
    pub async fn order_for_user(&self, user_id: &UserId, order_id: i64) -> Result<Option<OrderSnapshot>, OrderApiError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order.filter(|o| o.order.user_id == *user_id))
    }
}
