use std::env;

use jwt_compact::alg::Hs256Key;
use khalti_tools::KhaltiConfig;
use log::*;
use rand::RngCore;

use crate::errors::ServerError;

const DEFAULT_KPS_HOST: &str = "127.0.0.1";
const DEFAULT_KPS_PORT: u16 = 8360;
const DEFAULT_VERIFY_RETRY_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// How many times one verification call may retry its reconciliation transaction after losing a transient
    /// conflict, before giving up and telling the caller to poll again.
    pub verify_retry_attempts: u32,
    /// Khalti gateway configuration
    pub khalti_config: KhaltiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KPS_HOST.to_string(),
            port: DEFAULT_KPS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            verify_retry_attempts: DEFAULT_VERIFY_RETRY_ATTEMPTS,
            khalti_config: KhaltiConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("KPS_HOST").ok().unwrap_or_else(|| DEFAULT_KPS_HOST.into());
        let port = env::var("KPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for KPS_PORT. {e} Using the default, {DEFAULT_KPS_PORT}, instead."
                    );
                    DEFAULT_KPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_KPS_PORT);
        let database_url = env::var("KPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ KPS_DATABASE_URL is not set. Please set it to the URL for the KPS database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let verify_retry_attempts = env::var("KPS_VERIFY_RETRY_ATTEMPTS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for KPS_VERIFY_RETRY_ATTEMPTS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_VERIFY_RETRY_ATTEMPTS);
        let khalti_config = KhaltiConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, verify_retry_attempts, khalti_config }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
/// Verification half of the authentication contract. Tokens are issued by the external identity service; this server
/// only validates them, using the shared HS256 secret.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_verification_key: Hs256Key,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthConfig {{ jwt_verification_key: **** }}")
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT verification secret has not been set. I'm using a random value for this session, so NO \
             externally issued token will validate. Set KPS_JWT_SECRET to the secret shared with the identity \
             service. 🚨️🚨️🚨️"
        );
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self { jwt_verification_key: Hs256Key::new(secret.as_slice()) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("KPS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [KPS_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "KPS_JWT_SECRET must be at least 32 bytes long".to_string(),
            ));
        }
        Ok(Self { jwt_verification_key: Hs256Key::new(secret.as_bytes()) })
    }
}
