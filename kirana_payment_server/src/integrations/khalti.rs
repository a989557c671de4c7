//! Adapts the Khalti client onto the engine's `PaymentGateway` trait.

use khalti_tools::{CustomerInfo, InitiateRequest, KhaltiApi, KhaltiApiError, KhaltiPaymentStatus};
use kirana_payment_engine::traits::{ContactInfo, GatewayError, GatewayIntent, GatewayLookup, GatewayPaymentStatus, PaymentGateway};
use kps_common::Paisa;

#[derive(Clone)]
pub struct KhaltiGateway {
    api: KhaltiApi,
}

impl KhaltiGateway {
    pub fn new(api: KhaltiApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for KhaltiGateway {
    async fn create_intent(
        &self,
        reference: &str,
        amount: Paisa,
        contact: &ContactInfo,
    ) -> Result<GatewayIntent, GatewayError> {
        let config = self.api.config();
        let request = InitiateRequest {
            return_url: config.return_url.clone(),
            website_url: config.website_url.clone(),
            amount,
            purchase_order_id: reference.to_string(),
            purchase_order_name: format!("Order {reference}"),
            customer_info: CustomerInfo {
                name: contact.name.clone(),
                email: contact.email.clone(),
                phone: contact.phone.clone(),
            },
        };
        let response = self.api.initiate_payment(&request).await.map_err(map_gateway_error)?;
        Ok(GatewayIntent { pidx: response.pidx, payment_url: response.payment_url })
    }

    async fn lookup(&self, pidx: &str) -> Result<GatewayLookup, GatewayError> {
        let response = self.api.lookup(pidx).await.map_err(map_gateway_error)?;
        let status = match response.status {
            KhaltiPaymentStatus::Completed => GatewayPaymentStatus::Completed,
            KhaltiPaymentStatus::Pending => GatewayPaymentStatus::Pending,
            KhaltiPaymentStatus::Other(s) => GatewayPaymentStatus::Other(s),
        };
        Ok(GatewayLookup { status, transaction_id: response.transaction_id })
    }
}

fn map_gateway_error(e: KhaltiApiError) -> GatewayError {
    match e {
        KhaltiApiError::JsonError(m) => GatewayError::InvalidResponse(m),
        other => GatewayError::RequestFailed(other.to_string()),
    }
}
