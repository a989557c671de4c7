use std::fmt::Display;

use kirana_payment_engine::{
    db_types::{CartSnapshot, OrderSnapshot, Payment},
    PaymentIntent,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------  Requests  -----------------------------------------------------------

/// Body of `POST /api/payments/initiate`. `amount` is in rupees; it is converted to paisa at this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentParams {
    pub cart_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentParams {
    pub pidx: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemParams {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveItemParams {
    pub product_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemParams {
    pub product_id: i64,
    pub quantity: i64,
}

//----------------------------------------------  Responses  ----------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub message: String,
    pub payment: PaymentIntent,
}

/// Response of `POST /api/payments/verify`. All three verification outcomes use this shape; `order` is only present
/// once the payment has settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub payment: Payment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<CartSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub success: bool,
    pub message: String,
    pub orders: Vec<OrderSnapshot>,
}
