use chrono::{DateTime, Utc};
use kps_common::Paisa;
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderSnapshot, Payment};

/// The caller-facing view of an initiated payment: everything the client needs to send the customer to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub payment_id: i64,
    pub pidx: String,
    pub payment_url: String,
    pub amount: Paisa,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentIntent {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: payment.id,
            pidx: payment.pidx,
            payment_url: payment.payment_url,
            amount: payment.amount,
            created_at: payment.created_at,
        }
    }
}

/// The result of a verification call. All three variants are successful protocol outcomes; errors are reserved for
/// requests that could not be processed at all.
#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    /// The payment settled (now or previously) and exactly one order exists for its cart.
    Confirmed { payment: Payment, order: OrderSnapshot },
    /// The gateway has not reached a terminal state yet. The caller should poll again later.
    StillPending { payment: Payment },
    /// The gateway reported a terminal non-success. The cart is open for a fresh checkout.
    Declined { payment: Payment },
}
