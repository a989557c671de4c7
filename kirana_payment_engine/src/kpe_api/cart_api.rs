use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{CartSnapshot, UserId},
    kpe_api::errors::CartApiError,
    traits::CartManagement,
};

/// The `CartApi` provides the cart operations: viewing the working cart and mutating its line items.
pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's working cart, or `None` if they have no open cart. Callers usually render `None` as an empty cart.
    pub async fn cart_for_user(&self, user_id: &UserId) -> Result<Option<CartSnapshot>, CartApiError> {
        let snapshot = self.db.cart_for_user(user_id).await?;
        trace!("🛒️ Fetched cart for user {user_id}: {} line(s)", snapshot.as_ref().map(|s| s.items.len()).unwrap_or(0));
        Ok(snapshot)
    }

    pub async fn add_item(
        &self,
        user_id: &UserId,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartSnapshot, CartApiError> {
        validate_quantity(quantity)?;
        let snapshot = self.db.add_item_to_cart(user_id, product_id, quantity).await?;
        Ok(snapshot)
    }

    pub async fn remove_item(&self, user_id: &UserId, product_id: i64) -> Result<CartSnapshot, CartApiError> {
        let snapshot = self.db.remove_item_from_cart(user_id, product_id).await?;
        Ok(snapshot)
    }

    pub async fn update_quantity(
        &self,
        user_id: &UserId,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartSnapshot, CartApiError> {
        validate_quantity(quantity)?;
        let snapshot = self.db.update_item_quantity(user_id, product_id, quantity).await?;
        Ok(snapshot)
    }
}

fn validate_quantity(quantity: i64) -> Result<(), CartApiError> {
    if quantity < 1 {
        return Err(CartApiError::ValidationError("Quantity must be a positive integer".to_string()));
    }
    Ok(())
}
