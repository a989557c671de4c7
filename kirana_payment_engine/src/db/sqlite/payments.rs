use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentIntent, Payment},
    traits::CheckoutDbError,
};

const PAYMENT_COLUMNS: &str =
    "id, user_id, cart_id, amount, pidx, payment_url, transaction_id, status, paid_at, created_at, updated_at";

/// Stores a freshly initiated payment with status `Pending`. The partial unique index on open payments rejects a
/// second intent for the same cart with a unique violation.
pub async fn insert_payment_intent(
    intent: &NewPaymentIntent,
    conn: &mut SqliteConnection,
) -> Result<Payment, CheckoutDbError> {
    let query = format!(
        r#"
        INSERT INTO payments (user_id, cart_id, amount, pidx, payment_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PAYMENT_COLUMNS}
        "#
    );
    let payment = sqlx::query_as::<_, Payment>(&query)
        .bind(&intent.user_id)
        .bind(intent.cart_id)
        .bind(intent.amount)
        .bind(&intent.pidx)
        .bind(&intent.payment_url)
        .fetch_one(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_payment_by_pidx(pidx: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, CheckoutDbError> {
    let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE pidx = $1");
    let payment = sqlx::query_as::<_, Payment>(&query).bind(pidx).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn pending_payment_for_cart(
    cart_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, CheckoutDbError> {
    let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE cart_id = $1 AND status = 'Pending'");
    let payment = sqlx::query_as::<_, Payment>(&query).bind(cart_id).fetch_optional(conn).await?;
    Ok(payment)
}

/// Stamps the payment with the gateway's transaction id and the completion time. Returns the updated record.
pub async fn mark_payment_completed(
    pidx: &str,
    transaction_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Payment, CheckoutDbError> {
    let query = format!(
        r#"
        UPDATE payments
        SET status = 'Completed',
            transaction_id = $1,
            paid_at = CURRENT_TIMESTAMP,
            updated_at = CURRENT_TIMESTAMP
        WHERE pidx = $2
        RETURNING {PAYMENT_COLUMNS}
        "#
    );
    let payment = sqlx::query_as::<_, Payment>(&query).bind(transaction_id).bind(pidx).fetch_one(conn).await?;
    Ok(payment)
}

/// Marks the payment as failed. Returns the updated record.
pub async fn mark_payment_failed(pidx: &str, conn: &mut SqliteConnection) -> Result<Payment, CheckoutDbError> {
    let query = format!(
        r#"
        UPDATE payments
        SET status = 'Failed', updated_at = CURRENT_TIMESTAMP
        WHERE pidx = $1
        RETURNING {PAYMENT_COLUMNS}
        "#
    );
    let payment = sqlx::query_as::<_, Payment>(&query).bind(pidx).fetch_one(conn).await?;
    Ok(payment)
}
