use crate::{
    db_types::{CartSnapshot, UserId},
    traits::CheckoutDbError,
};

/// Cart reads and mutations.
///
/// Every mutation is one atomic unit: stock adjustment, line-item change and total-price recompute commit together.
/// A cart whose payment is in flight (`Pending`) rejects mutation with
/// [`CheckoutDbError::IllegalStatusChange`].
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// The user's current working cart (`Active` or `Pending`) with hydrated line items, or `None` if they have no
    /// open cart.
    async fn cart_for_user(&self, user_id: &UserId) -> Result<Option<CartSnapshot>, CheckoutDbError>;

    /// Adds `quantity` of the product to the user's working cart, creating the cart if necessary. Stock is reserved
    /// by decrementing the product's count.
    async fn add_item_to_cart(
        &self,
        user_id: &UserId,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartSnapshot, CheckoutDbError>;

    /// Removes the product's line item entirely, returning its quantity to stock.
    async fn remove_item_from_cart(&self, user_id: &UserId, product_id: i64) -> Result<CartSnapshot, CheckoutDbError>;

    /// Sets the line item to an absolute quantity, reserving or releasing the stock difference.
    async fn update_item_quantity(
        &self,
        user_id: &UserId,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartSnapshot, CheckoutDbError>;
}
