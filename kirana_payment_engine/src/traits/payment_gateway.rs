use kps_common::Paisa;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// The external payment provider, reduced to the two calls the engine needs.
///
/// The provider is treated as the authority on payment state; the engine never infers a payment outcome that the
/// lookup call did not report.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Registers a payment intent with the provider. `reference` is the merchant-side idempotent order reference.
    async fn create_intent(
        &self,
        reference: &str,
        amount: Paisa,
        contact: &ContactInfo,
    ) -> Result<GatewayIntent, GatewayError>;

    /// Fetches the authoritative status of the intent identified by `pidx`.
    async fn lookup(&self, pidx: &str) -> Result<GatewayLookup, GatewayError>;
}

/// Contact details forwarded to the provider's hosted payment page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A freshly created payment intent: the gateway reference and the URL the customer must be redirected to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntent {
    pub pidx: String,
    pub payment_url: String,
}

/// The tri-state result of a lookup call. Everything that is neither `Completed` nor `Pending` — failed, expired,
/// cancelled by the user — is `Other`, with the provider's wording preserved for the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayPaymentStatus {
    Completed,
    Pending,
    Other(String),
}

impl Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Pending => write!(f, "Pending"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayLookup {
    pub status: GatewayPaymentStatus,
    /// The provider's transaction id. Expected to be present when `status` is `Completed`.
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The gateway could not be reached: {0}")]
    RequestFailed(String),
    #[error("The gateway returned an unusable response: {0}")]
    InvalidResponse(String),
}
