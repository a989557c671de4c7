use kps_common::Paisa;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Cart, CartLine, CartStatus, UserId},
    traits::CheckoutDbError,
};

const CART_COLUMNS: &str = "id, user_id, total_price, status, created_at, updated_at";

pub async fn fetch_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, CheckoutDbError> {
    let query = format!("SELECT {CART_COLUMNS} FROM carts WHERE id = $1");
    let cart = sqlx::query_as::<_, Cart>(&query).bind(cart_id).fetch_optional(conn).await?;
    Ok(cart)
}

/// The user's working cart: the single `Active` or `Pending` cart the partial unique index allows.
pub async fn current_cart_for_user(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Cart>, CheckoutDbError> {
    let query = format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND status IN ('Active', 'Pending')");
    let cart = sqlx::query_as::<_, Cart>(&query).bind(user_id).fetch_optional(conn).await?;
    Ok(cart)
}

pub async fn insert_cart(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Cart, CheckoutDbError> {
    let query = format!("INSERT INTO carts (user_id) VALUES ($1) RETURNING {CART_COLUMNS}");
    let cart = sqlx::query_as::<_, Cart>(&query).bind(user_id).fetch_one(conn).await?;
    trace!("🛒️ Created cart #{} for user {}", cart.id, cart.user_id);
    Ok(cart)
}

pub async fn update_cart_status(
    cart_id: i64,
    status: CartStatus,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutDbError> {
    let status = status.to_string();
    let _ = sqlx::query("UPDATE carts SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// The cart's line items joined with their products, in insertion order.
pub async fn cart_lines(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, CheckoutDbError> {
    let lines = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT ci.product_id, p.name, p.price AS unit_price, ci.quantity
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Adds `quantity` to the product's line item, creating the line if this is the first time the product lands in the
/// cart.
pub async fn upsert_cart_item(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutDbError> {
    let _ = sqlx::query(
        r#"
        INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_item_quantity(
    cart_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, CheckoutDbError> {
    let quantity =
        sqlx::query_scalar::<_, i64>("SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .fetch_optional(conn)
            .await?;
    Ok(quantity)
}

pub async fn set_item_quantity(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutDbError> {
    let _ = sqlx::query("UPDATE cart_items SET quantity = $1 WHERE cart_id = $2 AND product_id = $3")
        .bind(quantity)
        .bind(cart_id)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_cart_item(
    cart_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutDbError> {
    let _ = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Recomputes the cached cart total from the line items and returns the new value.
pub async fn recompute_cart_total(cart_id: i64, conn: &mut SqliteConnection) -> Result<Paisa, CheckoutDbError> {
    let _ = sqlx::query(
        r#"
        UPDATE carts
        SET total_price = (
                SELECT COALESCE(SUM(ci.quantity * p.price), 0)
                FROM cart_items ci
                JOIN products p ON p.id = ci.product_id
                WHERE ci.cart_id = $1
            ),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        "#,
    )
    .bind(cart_id)
    .execute(&mut *conn)
    .await?;
    let total = sqlx::query_scalar::<_, Paisa>("SELECT total_price FROM carts WHERE id = $1")
        .bind(cart_id)
        .fetch_one(conn)
        .await?;
    Ok(total)
}
