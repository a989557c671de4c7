use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::KhaltiConfig,
    data_objects::{InitiateRequest, InitiateResponse, LookupResponse},
    KhaltiApiError,
};

/// Thin wrapper over the Khalti ePayment REST endpoints. Cheap to clone; the underlying HTTP client is shared.
#[derive(Clone)]
pub struct KhaltiApi {
    config: KhaltiConfig,
    client: Arc<Client>,
}

impl KhaltiApi {
    pub fn new(config: KhaltiConfig) -> Result<Self, KhaltiApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let auth = format!("Key {}", config.secret_key.reveal());
        let val = HeaderValue::from_str(&auth).map_err(|e| KhaltiApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| KhaltiApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &KhaltiConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn rest_post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, KhaltiApiError> {
        let url = self.url(path);
        trace!("Sending gateway request: {url}");
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| KhaltiApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Gateway request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| KhaltiApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| KhaltiApiError::RequestError(e.to_string()))?;
            Err(KhaltiApiError::QueryError { status, message })
        }
    }

    /// Creates a new payment intent at the gateway. The customer completes the payment at the returned `payment_url`.
    pub async fn initiate_payment(&self, request: &InitiateRequest) -> Result<InitiateResponse, KhaltiApiError> {
        debug!("Initiating payment intent for {}", request.purchase_order_id);
        let result: InitiateResponse = self.rest_post("/epayment/initiate/", request).await?;
        info!("Payment intent {} created for {}", result.pidx, request.purchase_order_id);
        Ok(result)
    }

    /// Fetches the authoritative state of the payment intent identified by `pidx`.
    pub async fn lookup(&self, pidx: &str) -> Result<LookupResponse, KhaltiApiError> {
        debug!("Looking up payment intent {pidx}");
        let body = serde_json::json!({ "pidx": pidx });
        let result: LookupResponse = self.rest_post("/epayment/lookup/", &body).await?;
        debug!("Payment intent {pidx} is {}", result.status);
        Ok(result)
    }
}
