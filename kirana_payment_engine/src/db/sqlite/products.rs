use kps_common::Paisa;
use sqlx::SqliteConnection;

use crate::{db_types::Product, traits::CheckoutDbError};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, available, created_at, updated_at";

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, CheckoutDbError> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let product = sqlx::query_as::<_, Product>(&query).bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Moves `delta` units between the shelf and carts: negative reserves stock, positive returns it. Availability tracks
/// whether any stock remains. Callers must have validated the reservation; the CHECK constraint on `stock` is the
/// backstop.
pub async fn adjust_stock(product_id: i64, delta: i64, conn: &mut SqliteConnection) -> Result<(), CheckoutDbError> {
    let _ = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + $1,
            available = CASE WHEN stock + $1 > 0 THEN 1 ELSE 0 END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2
        "#,
    )
    .bind(delta)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_product(
    name: &str,
    description: &str,
    price: Paisa,
    stock: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, CheckoutDbError> {
    let query = format!(
        r#"
        INSERT INTO products (name, description, price, stock, available)
        VALUES ($1, $2, $3, $4, CASE WHEN $4 > 0 THEN 1 ELSE 0 END)
        RETURNING {PRODUCT_COLUMNS}
        "#
    );
    let product = sqlx::query_as::<_, Product>(&query)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .fetch_one(conn)
        .await?;
    Ok(product)
}
