use crate::{
    db_types::{OrderSnapshot, UserId},
    traits::CheckoutDbError,
};

/// Read access to materialized orders. Orders are immutable once created, so this trait has no mutators.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<OrderSnapshot>, CheckoutDbError>;

    /// The user's purchase history, newest first.
    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderSnapshot>, CheckoutDbError>;
}
