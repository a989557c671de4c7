use log::*;
use kps_common::Secret;

const DEFAULT_KHALTI_BASE_URL: &str = "https://a.khalti.com/api/v2";

#[derive(Debug, Clone, Default)]
pub struct KhaltiConfig {
    /// Base URL of the Khalti ePayment API, without a trailing slash. The sandbox environment lives at
    /// `https://dev.khalti.com/api/v2`.
    pub base_url: String,
    pub secret_key: Secret<String>,
    /// Where Khalti redirects the customer after the gateway flow completes.
    pub return_url: String,
    pub website_url: String,
}

impl KhaltiConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("KHALTI_BASE_URL").unwrap_or_else(|_| {
            info!("KHALTI_BASE_URL not set, using the production endpoint {DEFAULT_KHALTI_BASE_URL}");
            DEFAULT_KHALTI_BASE_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("KHALTI_SECRET_KEY").unwrap_or_else(|_| {
            warn!("KHALTI_SECRET_KEY not set. Gateway calls will be rejected until it is configured.");
            String::default()
        }));
        let return_url = std::env::var("KHALTI_RETURN_URL").unwrap_or_else(|_| {
            warn!("KHALTI_RETURN_URL not set, using (probably useless) default");
            "http://localhost:3000/payment/verify".to_string()
        });
        let website_url = std::env::var("KHALTI_WEBSITE_URL").unwrap_or_else(|_| {
            warn!("KHALTI_WEBSITE_URL not set, using (probably useless) default");
            "http://localhost:3000/".to_string()
        });
        Self { base_url, secret_key, return_url, website_url }
    }
}
