use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{carts, db_url, new_pool, orders, payments, products};
use crate::{
    db_types::{Cart, CartSnapshot, CartStatus, NewPaymentIntent, OrderSnapshot, Payment, PaymentStatus, UserId},
    traits::{
        CartManagement,
        CheckoutDatabase,
        CheckoutDbError,
        GatewayLookup,
        GatewayPaymentStatus,
        InsertOrderOutcome,
        OrderManagement,
        ReconcileOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, CheckoutDbError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, CheckoutDbError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_cart(&self, cart_id: i64) -> Result<Option<Cart>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        carts::fetch_cart(cart_id, &mut conn).await
    }

    async fn fetch_payment_by_pidx(&self, pidx: &str) -> Result<Option<Payment>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment_by_pidx(pidx, &mut conn).await
    }

    async fn fetch_pending_payment_for_cart(&self, cart_id: i64) -> Result<Option<Payment>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        payments::pending_payment_for_cart(cart_id, &mut conn).await
    }

    async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<Payment, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::insert_payment_intent(&intent, &mut tx).await?;
        carts::update_cart_status(intent.cart_id, CartStatus::Pending, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment intent {} saved for cart #{}", payment.pidx, payment.cart_id);
        Ok(payment)
    }

    async fn fetch_order_for_cart(&self, cart_id: i64) -> Result<Option<OrderSnapshot>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_for_cart(cart_id, &mut conn).await?;
        match order {
            Some(order) => {
                let items = orders::order_items(order.id, &mut conn).await?;
                Ok(Some(OrderSnapshot { order, items }))
            },
            None => Ok(None),
        }
    }

    async fn reconcile_payment(&self, pidx: &str, lookup: &GatewayLookup) -> Result<ReconcileOutcome, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        // Re-read inside the transaction so the transition is applied to the latest committed state, not to whatever
        // the caller saw before the gateway round-trip.
        let payment = payments::fetch_payment_by_pidx(pidx, &mut tx)
            .await?
            .ok_or_else(|| CheckoutDbError::PaymentNotFound(pidx.to_string()))?;
        let cart =
            carts::fetch_cart(payment.cart_id, &mut tx).await?.ok_or(CheckoutDbError::CartNotFound(payment.cart_id))?;
        if payment.status == PaymentStatus::Completed {
            // A concurrent attempt settled this payment between the caller's read and now. Its order stands.
            let order = orders::fetch_order_for_cart(cart.id, &mut tx)
                .await?
                .ok_or(CheckoutDbError::OrderNotFound(cart.id))?;
            let items = orders::order_items(order.id, &mut tx).await?;
            tx.commit().await?;
            return Ok(ReconcileOutcome::Settled { payment, order: OrderSnapshot { order, items } });
        }
        if payment.status != PaymentStatus::Pending {
            // Failed and Refunded are terminal. Nothing to reconcile.
            tx.commit().await?;
            return Ok(ReconcileOutcome::Declined { payment });
        }
        match &lookup.status {
            GatewayPaymentStatus::Completed => {
                let lines = carts::cart_lines(cart.id, &mut tx).await?;
                let order = match orders::insert_order(&payment.user_id, cart.id, cart.total_price, &lines, &mut tx)
                    .await?
                {
                    InsertOrderOutcome::Inserted(order) => order,
                    InsertOrderOutcome::AlreadyExists(order) => order,
                };
                let items = orders::order_items(order.id, &mut tx).await?;
                let payment = payments::mark_payment_completed(pidx, lookup.transaction_id.as_deref(), &mut tx).await?;
                carts::update_cart_status(cart.id, CartStatus::Purchased, &mut tx).await?;
                tx.commit().await?;
                info!("🗃️ Payment {pidx} settled. Order #{} created for cart #{}", order.id, cart.id);
                Ok(ReconcileOutcome::Settled { payment, order: OrderSnapshot { order, items } })
            },
            GatewayPaymentStatus::Pending => {
                // The gateway has not concluded. Leave every record exactly as it is.
                tx.commit().await?;
                Ok(ReconcileOutcome::StillPending { payment })
            },
            GatewayPaymentStatus::Other(reason) => {
                let payment = payments::mark_payment_failed(pidx, &mut tx).await?;
                carts::update_cart_status(cart.id, CartStatus::Active, &mut tx).await?;
                tx.commit().await?;
                info!("🗃️ Payment {pidx} declined by the gateway ({reason}). Cart #{} is open again.", cart.id);
                Ok(ReconcileOutcome::Declined { payment })
            },
        }
    }

    async fn close(&mut self) -> Result<(), CheckoutDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CartManagement for SqliteDatabase {
    async fn cart_for_user(&self, user_id: &UserId) -> Result<Option<CartSnapshot>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::current_cart_for_user(user_id, &mut conn).await?;
        match cart {
            Some(cart) => {
                let items = carts::cart_lines(cart.id, &mut conn).await?;
                Ok(Some(CartSnapshot { cart, items }))
            },
            None => Ok(None),
        }
    }

    async fn add_item_to_cart(
        &self,
        user_id: &UserId,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartSnapshot, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        let product =
            products::fetch_product(product_id, &mut tx).await?.ok_or(CheckoutDbError::ProductNotFound(product_id))?;
        if !product.available || product.stock < quantity {
            return Err(CheckoutDbError::InsufficientStock(product_id));
        }
        let cart = match carts::current_cart_for_user(user_id, &mut tx).await? {
            Some(cart) if cart.status == CartStatus::Pending => {
                return Err(CheckoutDbError::IllegalStatusChange(format!(
                    "Cart #{} has a payment in flight and cannot be modified",
                    cart.id
                )));
            },
            Some(cart) => cart,
            None => carts::insert_cart(user_id, &mut tx).await?,
        };
        carts::upsert_cart_item(cart.id, product_id, quantity, &mut tx).await?;
        products::adjust_stock(product_id, -quantity, &mut tx).await?;
        let snapshot = refreshed_snapshot(cart.id, &mut tx).await?;
        tx.commit().await?;
        trace!("🛒️ Added {quantity} × product #{product_id} to cart #{}", snapshot.cart.id);
        Ok(snapshot)
    }

    async fn remove_item_from_cart(&self, user_id: &UserId, product_id: i64) -> Result<CartSnapshot, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::current_cart_for_user(user_id, &mut tx).await?.ok_or(CheckoutDbError::NoCurrentCart)?;
        if cart.status == CartStatus::Pending {
            return Err(CheckoutDbError::IllegalStatusChange(format!(
                "Cart #{} has a payment in flight and cannot be modified",
                cart.id
            )));
        }
        let removed = carts::fetch_item_quantity(cart.id, product_id, &mut tx)
            .await?
            .ok_or(CheckoutDbError::ItemNotInCart(product_id))?;
        carts::delete_cart_item(cart.id, product_id, &mut tx).await?;
        products::adjust_stock(product_id, removed, &mut tx).await?;
        let snapshot = refreshed_snapshot(cart.id, &mut tx).await?;
        tx.commit().await?;
        trace!("🛒️ Removed product #{product_id} from cart #{}", snapshot.cart.id);
        Ok(snapshot)
    }

    async fn update_item_quantity(
        &self,
        user_id: &UserId,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartSnapshot, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        let product =
            products::fetch_product(product_id, &mut tx).await?.ok_or(CheckoutDbError::ProductNotFound(product_id))?;
        let cart = carts::current_cart_for_user(user_id, &mut tx).await?.ok_or(CheckoutDbError::NoCurrentCart)?;
        if cart.status == CartStatus::Pending {
            return Err(CheckoutDbError::IllegalStatusChange(format!(
                "Cart #{} has a payment in flight and cannot be modified",
                cart.id
            )));
        }
        let old_quantity = carts::fetch_item_quantity(cart.id, product_id, &mut tx)
            .await?
            .ok_or(CheckoutDbError::ItemNotInCart(product_id))?;
        let difference = quantity - old_quantity;
        if difference > 0 && product.stock < difference {
            return Err(CheckoutDbError::InsufficientStock(product_id));
        }
        carts::set_item_quantity(cart.id, product_id, quantity, &mut tx).await?;
        products::adjust_stock(product_id, -difference, &mut tx).await?;
        let snapshot = refreshed_snapshot(cart.id, &mut tx).await?;
        tx.commit().await?;
        trace!("🛒️ Set product #{product_id} to {quantity} in cart #{}", snapshot.cart.id);
        Ok(snapshot)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<OrderSnapshot>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        match order {
            Some(order) => {
                let items = orders::order_items(order.id, &mut conn).await?;
                Ok(Some(OrderSnapshot { order, items }))
            },
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderSnapshot>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let order_rows = orders::orders_for_user(user_id, &mut conn).await?;
        let mut result = Vec::with_capacity(order_rows.len());
        for order in order_rows {
            let items = orders::order_items(order.id, &mut conn).await?;
            result.push(OrderSnapshot { order, items });
        }
        Ok(result)
    }
}

/// Re-reads the cart (with its freshly recomputed total) and hydrates the line items.
async fn refreshed_snapshot(
    cart_id: i64,
    conn: &mut sqlx::SqliteConnection,
) -> Result<CartSnapshot, CheckoutDbError> {
    carts::recompute_cart_total(cart_id, conn).await?;
    let cart = carts::fetch_cart(cart_id, conn).await?.ok_or(CheckoutDbError::CartNotFound(cart_id))?;
    let items = carts::cart_lines(cart_id, conn).await?;
    Ok(CartSnapshot { cart, items })
}
