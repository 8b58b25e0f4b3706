//! Signed session tokens.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::SecurityConfig;
use crate::domain::{Actor, ObjectId, Permission, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: ObjectId,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<UserRole>,
    pub permissions: BTreeSet<Permission>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl: chrono::Duration::minutes(
                config
                    .token_ttl_minutes
                    .clamp(1, SecurityConfig::MAX_TOKEN_TTL_MINUTES),
            ),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn issue(&self, actor: &Actor) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: actor.id,
            email: actor.email.clone(),
            full_name: actor.full_name.clone(),
            roles: actor.roles.clone(),
            permissions: actor.permissions.clone(),
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Checks signature and expiry, returning the caller the token was issued to.
    pub fn verify(&self, token: &str) -> Result<Actor, jsonwebtoken::errors::Error> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;

        Ok(Actor {
            id: claims.sub,
            email: claims.email,
            full_name: claims.full_name,
            roles: claims.roles,
            permissions: claims.permissions,
        })
    }
}
