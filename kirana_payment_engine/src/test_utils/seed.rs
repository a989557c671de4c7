use kps_common::Paisa;

use crate::{db::sqlite::products, db_types::Product, SqliteDatabase};

/// Inserts the given `(name, price, stock)` triples and returns the created products in order.
pub async fn seed_products(db: &SqliteDatabase, items: &[(&str, Paisa, i64)]) -> Vec<Product> {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let mut result = Vec::with_capacity(items.len());
    for (name, price, stock) in items {
        let product =
            products::insert_product(name, "", *price, *stock, &mut conn).await.expect("Error seeding product");
        result.push(product);
    }
    result
}
