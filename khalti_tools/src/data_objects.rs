use chrono::{DateTime, Utc};
use kps_common::Paisa;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Contact details Khalti displays on the payment page. All three fields are required by the initiate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Request body for `POST /epayment/initiate/`.
///
/// `amount` is in paisa. `purchase_order_id` is the merchant-side idempotent reference; Khalti echoes it back in the
/// redirect and lookup responses.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateRequest {
    pub return_url: String,
    pub website_url: String,
    pub amount: Paisa,
    pub purchase_order_id: String,
    pub purchase_order_name: String,
    pub customer_info: CustomerInfo,
}

/// Response body for `POST /epayment/initiate/`. `pidx` is the gateway reference for the new payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateResponse {
    pub pidx: String,
    pub payment_url: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// The state Khalti reports for a payment intent.
///
/// The lookup endpoint returns a handful of statuses (`Initiated`, `Expired`, `User canceled`, `Refunded`, ...), but
/// only `Completed` and `Pending` drive distinct behaviour downstream. Everything else is preserved verbatim in
/// `Other` so it can be logged, and is treated as a failed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KhaltiPaymentStatus {
    Completed,
    Pending,
    Other(String),
}

impl From<String> for KhaltiPaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Completed" => Self::Completed,
            "Pending" => Self::Pending,
            _ => Self::Other(value),
        }
    }
}

impl From<KhaltiPaymentStatus> for String {
    fn from(value: KhaltiPaymentStatus) -> Self {
        match value {
            KhaltiPaymentStatus::Completed => "Completed".to_string(),
            KhaltiPaymentStatus::Pending => "Pending".to_string(),
            KhaltiPaymentStatus::Other(s) => s,
        }
    }
}

impl Display for KhaltiPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Pending => write!(f, "Pending"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Response body for `POST /epayment/lookup/`. `transaction_id` is only present once the payment has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub pidx: String,
    pub total_amount: Paisa,
    pub status: KhaltiPaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub fee: Option<i64>,
    #[serde(default)]
    pub refunded: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_response_completed() {
        let json = r#"{
            "pidx": "HT6o6PEZRWFJ5ygavzHWd5",
            "total_amount": 5000,
            "status": "Completed",
            "transaction_id": "GFq9PFS7b2iYvL8Lir9oXe",
            "fee": 150,
            "refunded": false
        }"#;
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, KhaltiPaymentStatus::Completed);
        assert_eq!(response.total_amount, Paisa::from(5000));
        assert_eq!(response.transaction_id.as_deref(), Some("GFq9PFS7b2iYvL8Lir9oXe"));
    }

    #[test]
    fn lookup_response_pending_has_no_transaction_id() {
        let json = r#"{"pidx": "HT6o6PEZRWFJ5ygavzHWd5", "total_amount": 5000, "status": "Pending"}"#;
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, KhaltiPaymentStatus::Pending);
        assert!(response.transaction_id.is_none());
        assert!(!response.refunded);
    }

    #[test]
    fn unknown_statuses_are_preserved() {
        let status = KhaltiPaymentStatus::from("User canceled".to_string());
        assert_eq!(status, KhaltiPaymentStatus::Other("User canceled".to_string()));
        assert_eq!(String::from(status), "User canceled");
    }

    #[test]
    fn initiate_request_serializes_amount_in_paisa() {
        let request = InitiateRequest {
            return_url: "https://example.com/payment/verify".to_string(),
            website_url: "https://example.com/".to_string(),
            amount: Paisa::from_rupees(50),
            purchase_order_id: "ORDER-42-a1b2c3".to_string(),
            purchase_order_name: "Order 42".to_string(),
            customer_info: CustomerInfo {
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                phone: "9800000001".to_string(),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["amount"], 5000);
        assert_eq!(value["purchase_order_id"], "ORDER-42-a1b2c3");
    }
}
