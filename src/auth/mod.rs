//! Admin session verification.
//!
//! Login and token issuance live outside this service; admin routes only check a
//! `Authorization: Bearer <jwt>` header signed with the shared HS256 secret. The
//! token subject is the acting admin's id and is recorded on manual ledger entries.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

/// JWT claims carried by an admin session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,          // Admin user id
    pub name: Option<String>, // Display name
    pub iat: i64,             // Issued at time
    pub exp: i64,             // Expiration time
}

/// Authenticated admin extracted from the bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub admin_id: Uuid,
    pub name: Option<String>,
}

/// Verifies (and, for tooling and tests, signs) admin session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn issue(
        &self,
        admin_id: Uuid,
        name: Option<String>,
        ttl: chrono::Duration,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: admin_id.to_string(),
            name,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::InternalError(format!("Failed to sign session token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<AdminSession, ServiceError> {
        let claims = decode::<AdminClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ServiceError::Unauthorized("Session token has expired".to_string())
                }
                _ => ServiceError::Unauthorized("Invalid session token".to_string()),
            })?
            .claims;

        let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            ServiceError::Unauthorized("Session token subject is not an admin id".to_string())
        })?;

        Ok(AdminSession {
            admin_id,
            name: claims.name,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    Arc<SessionKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            debug!(uri = %parts.uri, "Admin route called without bearer token");
            return Err(ServiceError::Unauthorized(
                "Missing bearer token".to_string(),
            ));
        };

        let keys = Arc::<SessionKeys>::from_ref(state);
        keys.verify(token).map_err(|e| {
            warn!(uri = %parts.uri, error = %e, "Rejected admin session");
            e
        })
    }
}
