use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::Duration;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use kirana_payment_engine::{db_types::UserId, traits::ContactInfo};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The header callers put their access token in.
pub const AUTH_HEADER: &str = "kps_auth_token";

/// The identity claim minted by the external identity service. The server treats `user_id` as opaque; the contact
/// fields are only forwarded to the payment gateway's hosted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl JwtClaims {
    /// Contact details for the gateway, with the placeholders the payment page requires when a field is missing.
    pub fn contact_info(&self) -> ContactInfo {
        ContactInfo {
            name: if self.name.is_empty() { "Customer".to_string() } else { self.name.clone() },
            email: if self.email.is_empty() { "customer@example.com".to_string() } else { self.email.clone() },
            phone: if self.phone.is_empty() { "9800000000".to_string() } else { self.phone.clone() },
        }
    }
}

/// Validates the token's HS256 signature and expiry and returns its claims.
pub fn check_auth_token<S: AsRef<str>>(token: S, key: &Hs256Key) -> Result<JwtClaims, AuthError> {
    let untrusted_token =
        UntrustedToken::new(token.as_ref()).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e:?}")))?;
    let token = Hs256
        .validator::<JwtClaims>(key)
        .validate(&untrusted_token)
        .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
    token
        .claims()
        .validate_expiration(&TimeOptions::default())
        .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
    debug!("💻️ Auth token validated for user {}", token.claims().custom.user_id);
    Ok(token.claims().custom.clone())
}

/// Extracts and validates the identity claim on every request that asks for `JwtClaims`.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = claims_from_request(req);
        ready(result)
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let auth = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(|| ServerError::InitializeError("Auth configuration is not installed".to_string()))?;
    let header = req.headers().get(AUTH_HEADER).ok_or(ServerError::CouldNotDeserializeAuthToken)?;
    let token = header.to_str().map_err(|e| {
        debug!("💻️ Could not read auth token. {e}");
        ServerError::CouldNotDeserializeAuthToken
    })?;
    let claims = check_auth_token(token, &auth.jwt_verification_key)?;
    Ok(claims)
}

/// Mints access tokens with the shared secret. The production issuer is the external identity service; this type
/// exists for tests and operational tooling.
pub struct TokenIssuer {
    key: Hs256Key,
}

impl TokenIssuer {
    pub fn new(key: Hs256Key) -> Self {
        Self { key }
    }

    pub fn issue_token(&self, claims: JwtClaims, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or_else(|| Duration::hours(24));
        let time_options = TimeOptions::default();
        let claims = Claims::new(claims).set_duration_and_issuance(&time_options, duration);
        let header = Header::empty().with_token_type("JWT");
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_key() -> Hs256Key {
        Hs256Key::new(b"a-test-secret-that-is-long-enough")
    }

    fn claims() -> JwtClaims {
        JwtClaims {
            user_id: UserId::from("user-asha"),
            name: "Asha Gurung".to_string(),
            email: "asha@example.com".to_string(),
            phone: String::new(),
        }
    }

    #[test]
    fn issued_tokens_validate() {
        let issuer = TokenIssuer::new(test_key());
        let token = issuer.issue_token(claims(), None).unwrap();
        let validated = check_auth_token(&token, &test_key()).unwrap();
        assert_eq!(validated, claims());
    }

    #[test]
    fn tokens_signed_with_another_key_are_rejected() {
        let issuer = TokenIssuer::new(Hs256Key::new(b"a-different-secret-thats-also-long"));
        let token = issuer.issue_token(claims(), None).unwrap();
        let err = check_auth_token(&token, &test_key()).unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new(test_key());
        let token = issuer.issue_token(claims(), Some(Duration::seconds(-60))).unwrap();
        let err = check_auth_token(&token, &test_key()).unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let err = check_auth_token("not-a-jwt", &test_key()).unwrap_err();
        assert!(matches!(err, AuthError::PoorlyFormattedToken(_)));
    }

    #[test]
    fn missing_contact_fields_fall_back_to_placeholders() {
        let contact = claims().contact_info();
        assert_eq!(contact.name, "Asha Gurung");
        assert_eq!(contact.phone, "9800000000");
    }
}
