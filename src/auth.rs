use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ApiError;

/// Name of the cookie the frontend's hosting layer forwards the ID token in.
pub const SESSION_COOKIE: &str = "__session";

/// Audience the identity provider stamps on signed-in users' access tokens.
pub const DEFAULT_AUDIENCE: &str = "authenticated";

/// Claims
///
/// The JWT payload issued by the identity provider. Only `sub` and the time bounds are
/// required; `email` and the admin flag are carried through to `AuthUser` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the provider's user id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Audience (aud). Checked against the verifier's expected audience when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Server-controlled metadata; the admin provisioner writes its flag here.
    #[serde(default)]
    pub app_metadata: AppMetadata,
    /// Expiration Time (exp). Always validated.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AppMetadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Set by the admin provisioner. Carried for logging; writes are not gated on it.
    #[serde(default)]
    pub admin: bool,
}

/// AuthUser
///
/// The verified identity of a request. The auth gate stores it in the request
/// extensions; handlers can take it as an extractor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            uid: claims.sub,
            email: claims.email,
            admin: claims.app_metadata.admin,
        }
    }
}

/// VerifyError
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token revoked")]
    Revoked,

    /// The verifier itself could not be reached; not the caller's fault.
    #[error("token verifier unavailable: {0}")]
    Unavailable(String),
}

/// TokenVerifier Contract
///
/// The identity collaborator. Given an opaque bearer token it returns the verified
/// identity or fails. Swapped for `StaticTokenVerifier` in tests.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError>;
}

/// TokenVerifierState
pub type TokenVerifierState = Arc<dyn TokenVerifier>;

/// JwtTokenVerifier
///
/// Verifies HS256 tokens signed with the provider's shared secret. Expiry is always
/// checked; a token carrying `aud` must name the expected audience.
#[derive(Clone)]
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    /// Expects the provider's default `authenticated` audience.
    pub fn new(secret: &str) -> Self {
        Self::with_audience(secret, DEFAULT_AUDIENCE)
    }

    pub fn with_audience(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.set_audience(&[audience]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims.into()),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(VerifyError::Expired),
                _ => Err(VerifyError::Invalid),
            },
        }
    }
}

/// StaticTokenVerifier
///
/// An in-memory verifier mapping fixed tokens to identities. Tokens can be revoked to
/// simulate a provider-side sign-out.
#[derive(Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, AuthUser>,
    revoked: Vec<String>,
    /// When true, every call fails as if the provider were down.
    pub should_fail: bool,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user: AuthUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    pub fn with_revoked(mut self, token: impl Into<String>) -> Self {
        self.revoked.push(token.into());
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError> {
        if self.should_fail {
            return Err(VerifyError::Unavailable("static verifier offline".to_string()));
        }
        if self.revoked.iter().any(|t| t == token) {
            return Err(VerifyError::Revoked);
        }
        self.tokens.get(token).cloned().ok_or(VerifyError::Invalid)
    }
}

/// extract_token
///
/// Pulls the credential from `Authorization: Bearer <token>`, falling back to the
/// `__session` cookie. Empty values count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
}

/// AuthUser Extractor Implementation
///
/// 1. Reuses the identity already attached by the auth gate, if any.
/// 2. Extracts the token; a request without one is rejected before the verifier is
///    called.
/// 3. Delegates verification to the configured `TokenVerifier`.
///
/// Any verified caller is fully privileged: there is no role check.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenVerifierState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let Some(token) = extract_token(&parts.headers) else {
            tracing::warn!(uri = %parts.uri, "rejected request without credentials");
            return Err(ApiError::unauthorized("No token provided"));
        };

        let verifier = TokenVerifierState::from_ref(state);

        verifier.verify(&token).await.map_err(|e| {
            tracing::warn!(uri = %parts.uri, reason = %e, "token verification failed");
            ApiError::from(e)
        })
    }
}
