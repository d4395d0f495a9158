//! Authorization-token decoding
//!
//! Extractors that turn the `Authorization` header into a typed
//! authorization context. Token *verification* is `jsonwebtoken`'s job;
//! this module only configures the key, decodes the claims, and maps
//! failures to 401 responses. Token issuance belongs to the identity
//! provider and is not done here.
//!
//! # Usage
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use parapet::auth::{AuthConfig, AuthorizationContext};
//!
//! async fn whoami(context: AuthorizationContext) -> String {
//!     context.user_id
//! }
//!
//! let config = AuthConfig::hs256(b"shared-secret");
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .with_state(config);
//! ```

use crate::error::AppError;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::convert::Infallible;

/// Role carried in the token claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Authorization claims decoded from a verified token.
///
/// Unknown claims are ignored; a missing `role` defaults to
/// [`Role::User`].
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationContext {
    /// Subject of the token
    pub user_id: String,
    /// Role granted to the subject
    #[serde(default)]
    pub role: Role,
    /// Device the token was issued to, when the issuer tracks devices
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Optional request-correlation headers.
///
/// All fields are `None` when the client doesn't send them; extraction
/// never fails.
#[derive(Debug, Clone, Default)]
pub struct TracingHeaders {
    /// `session-id` header
    pub session_id: Option<String>,
    /// `device-id` header
    pub device_id: Option<String>,
    /// Raw `authorization` header, undecoded
    pub token: Option<String>,
}

/// Token verification configuration: decoding key plus validation rules.
///
/// Built programmatically or loaded from the environment. Stored in the
/// router state; the [`AuthorizationContext`] extractor pulls it out via
/// [`FromRef`].
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    /// Symmetric HS256 verification with a shared secret.
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Asymmetric RS256 verification with an RSA public key in PEM form.
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, AppError> {
        let decoding_key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| AppError::internal("invalid RSA public key", e))?;
        Ok(Self {
            decoding_key,
            validation: Validation::new(Algorithm::RS256),
        })
    }

    /// Load from environment variables.
    ///
    /// `AUTH_JWT_ALGORITHM` selects the scheme (default `HS256`):
    /// - `HS256` reads the shared secret from `AUTH_JWT_SECRET`
    /// - `RS256` reads a PEM file path from `AUTH_JWT_PUBLIC_KEY`
    pub fn from_env() -> Result<Self, AppError> {
        let algorithm =
            std::env::var("AUTH_JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string());

        match algorithm.as_str() {
            "HS256" => {
                let secret = std::env::var("AUTH_JWT_SECRET").map_err(|_| {
                    AppError::new(
                        crate::error::ErrorKind::Internal,
                        "AUTH_JWT_SECRET is not set",
                    )
                })?;
                Ok(Self::hs256(secret.as_bytes()))
            }
            "RS256" => {
                let path = std::env::var("AUTH_JWT_PUBLIC_KEY").map_err(|_| {
                    AppError::new(
                        crate::error::ErrorKind::Internal,
                        "AUTH_JWT_PUBLIC_KEY is not set",
                    )
                })?;
                let pem = std::fs::read(&path)?;
                Self::rs256_pem(&pem)
            }
            other => Err(AppError::new(
                crate::error::ErrorKind::Internal,
                format!("unsupported JWT algorithm: {other}"),
            )),
        }
    }
}

/// Decode and verify an authorization token.
///
/// A `Bearer ` prefix is stripped when present. Verification failures
/// map to 401 via [`AppError`].
pub fn decode_authorization_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AuthorizationContext, AppError> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token);
    let data = decode::<AuthorizationContext>(token, &config.decoding_key, &config.validation)?;
    Ok(data.claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizationContext
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;
        decode_authorization_token(token, &config)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TracingHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        Ok(Self {
            session_id: header_value("session-id"),
            device_id: header_value("device-id"),
            token: header_value("authorization"),
        })
    }
}
