use kps_common::Paisa;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CartLine, Order, OrderItem, UserId},
    traits::{CheckoutDbError, InsertOrderOutcome},
};

const ORDER_COLUMNS: &str = "id, user_id, cart_id, total_price, status, created_at";

/// Materializes an order from the given cart lines.
///
/// The `orders.cart_id` uniqueness constraint makes this safe under races: if a concurrent settlement committed its
/// order first, this insert fails with a unique violation, and the existing order is fetched and returned as
/// [`InsertOrderOutcome::AlreadyExists`]. Losing the race is an expected outcome, not an error.
pub async fn insert_order(
    user_id: &UserId,
    cart_id: i64,
    total_price: Paisa,
    lines: &[CartLine],
    conn: &mut SqliteConnection,
) -> Result<InsertOrderOutcome, CheckoutDbError> {
    let query =
        format!("INSERT INTO orders (user_id, cart_id, total_price) VALUES ($1, $2, $3) RETURNING {ORDER_COLUMNS}");
    let inserted = sqlx::query_as::<_, Order>(&query)
        .bind(user_id)
        .bind(cart_id)
        .bind(total_price)
        .fetch_one(&mut *conn)
        .await;
    let order = match inserted {
        Ok(order) => order,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("🧾️ Order for cart #{cart_id} already exists. Adopting the winner of the insert race.");
            let existing =
                fetch_order_for_cart(cart_id, conn).await?.ok_or(CheckoutDbError::OrderNotFound(cart_id))?;
            return Ok(InsertOrderOutcome::AlreadyExists(existing));
        },
        Err(e) => return Err(e.into()),
    };
    for line in lines {
        let _ = sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *conn)
            .await?;
    }
    debug!("🧾️ Order #{} materialized from cart #{cart_id}", order.id);
    Ok(InsertOrderOutcome::Inserted(order))
}

pub async fn fetch_order_for_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, CheckoutDbError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE cart_id = $1");
    let order = sqlx::query_as::<_, Order>(&query).bind(cart_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, CheckoutDbError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&query).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, CheckoutDbError> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, unit_price FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Purchase history for the user, newest first.
pub async fn orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, CheckoutDbError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC");
    let orders = sqlx::query_as::<_, Order>(&query).bind(user_id).fetch_all(conn).await?;
    Ok(orders)
}
