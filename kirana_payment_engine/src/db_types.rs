use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use kps_common::Paisa;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------       UserId        ----------------------------------------------------------
/// The opaque identity claim attached to a request by the authentication collaborator. The engine never inspects it;
/// it only compares it against record ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------      CartStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CartStatus {
    /// The user's working cart. Items can be added and removed, and checkout can begin.
    Active,
    /// A payment intent exists for this cart. The cart is frozen until the payment settles or fails.
    Pending,
    /// The payment settled and an order was materialized from this cart.
    Purchased,
    /// Abandoned by the user or an admin.
    Cancelled,
}

impl Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartStatus::Active => write!(f, "Active"),
            CartStatus::Pending => write!(f, "Pending"),
            CartStatus::Purchased => write!(f, "Purchased"),
            CartStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for CartStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Pending" => Ok(Self::Pending),
            "Purchased" => Ok(Self::Purchased),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid cart status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The intent exists at the gateway but no terminal result has been observed yet.
    Pending,
    /// The gateway confirmed the payment. Terminal.
    Completed,
    /// The gateway reported the payment as failed, expired or cancelled. Terminal.
    Failed,
    /// Money was returned to the customer after completion. Set by refund tooling, never by verification.
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     OrderStatus     ----------------------------------------------------------
/// Orders are only ever materialized from a settled payment, so `Purchased` is currently the sole status. The column
/// exists so that fulfilment states can be added without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    Purchased,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Purchased => write!(f, "Purchased"),
        }
    }
}

//--------------------------------------       Product       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Paisa,
    pub stock: i64,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Cart         ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: UserId,
    /// Cached sum over the line items; recomputed inside every cart mutation.
    pub total_price: Paisa,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line item joined with the product it refers to, as served to clients.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Paisa,
    pub quantity: i64,
}

/// A cart together with its hydrated line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub items: Vec<CartLine>,
}

//--------------------------------------       Payment       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub user_id: UserId,
    pub cart_id: i64,
    pub amount: Paisa,
    /// The reference the gateway assigned to this payment intent.
    pub pidx: String,
    pub payment_url: String,
    /// The gateway's transaction id. Only present once the payment has completed.
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the store needs to persist a freshly initiated payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaymentIntent {
    pub user_id: UserId,
    pub cart_id: i64,
    pub amount: Paisa,
    pub pidx: String,
    pub payment_url: String,
}

//--------------------------------------        Order        ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: UserId,
    pub cart_id: i64,
    pub total_price: Paisa,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A line item snapshotted into an order at settlement time. `unit_price` is the price at purchase; later product
/// price changes do not affect it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Paisa,
}

/// An order together with its snapshotted line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
