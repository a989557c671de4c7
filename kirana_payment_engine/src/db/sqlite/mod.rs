pub mod db;

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;

use std::env;

pub use db::SqliteDatabase;
use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::traits::CheckoutDbError;

const SQLITE_DB_URL: &str = "sqlite://data/kirana_store.db";

pub fn db_url() -> String {
    let result = env::var("KPS_DATABASE_URL").unwrap_or_else(|_| {
        info!("KPS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, CheckoutDbError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
