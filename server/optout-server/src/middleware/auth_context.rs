//! Bearer-token authentication
//!
//! Tokens are HS256 JWTs carrying the caller's subject and roles. Admin
//! endpoints check for the administrator role; consumer endpoints check for
//! the consumer role and then match the subject against
//! `Consumer.client_id`.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use chrono::{Duration, Utc};
use config_engine::AuthSettings;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::OptOutServer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Signs and checks bearer tokens with the configured shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl TokenService {
    pub fn new(secret: &str, issuer: Option<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss]);
        }
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(&settings.jwt_secret, settings.issuer.clone())
    }

    /// Sign a token for `subject` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Fails only if the claims cannot be serialized.
    pub fn issue(
        &self,
        subject: &str,
        roles: &[&str],
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.iter().map(|r| (*r).to_string()).collect(),
            email: None,
            exp: (Utc::now() + ttl).timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// # Errors
    ///
    /// [`ApiError::Authentication`] for a bad signature, an expired token or
    /// a wrong issuer.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ApiError::authentication(format!("Invalid or expired token: {e}")))
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject: String,
    pub roles: Vec<String>,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// # Errors
    ///
    /// [`ApiError::Authorization`] when the caller lacks `role`.
    pub fn require_role(&self, role: &str) -> Result<(), ApiError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::authorization(format!("Role '{role}' is required")))
        }
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            roles: claims.roles,
            email: claims.email,
        }
    }
}

/// Pull the bearer token out of the Authorization header
fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::missing_token("Missing Authorization header"))?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::authentication("Invalid Authorization header format. Expected: Bearer <token>")
    })
}

#[async_trait]
impl FromRequestParts<OptOutServer> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &OptOutServer,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let claims = state.tokens.verify(token)?;

        tracing::debug!(subject = %claims.sub, roles = ?claims.roles, "Authenticated request");

        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    const SECRET: &str = "test-secret-with-at-least-thirty-two-bytes";

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new(SECRET, Some("optout".to_string()));
        let token = tokens
            .issue("admin-1", &["Administrators"], Duration::minutes(5))
            .unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin-1");
        assert_eq!(claims.roles, vec!["Administrators".to_string()]);

        let context = AuthContext::from(claims);
        assert!(context.require_role("Administrators").is_ok());
        assert!(context.require_role("Consumers").is_err());
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired_tokens() {
        let tokens = TokenService::new(SECRET, None);
        let other = TokenService::new("another-secret-with-at-least-32-bytes!", None);

        let foreign = other.issue("x", &[], Duration::minutes(5)).unwrap();
        assert!(tokens.verify(&foreign).is_err());

        let expired = tokens.issue("x", &[], Duration::minutes(-10)).unwrap();
        assert!(tokens.verify(&expired).is_err());
    }

    #[test]
    fn test_extract_token() {
        let (parts, ()) = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(extract_token(&parts).unwrap(), "abc.def");

        let (parts, ()) = Request::builder()
            .header(AUTHORIZATION, "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        assert!(extract_token(&parts).is_err());

        let (parts, ()) = Request::builder().body(()).unwrap().into_parts();
        assert!(matches!(
            extract_token(&parts),
            Err(ApiError::Authentication { code, .. }) if code == error_common::codes::authentication::MISSING_TOKEN
        ));
    }
}
