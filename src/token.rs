//! Manage json web tokens.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::config::Token as TokenConfig;
use crate::error::{Result, ServerError};

const DEFAULT_AUDIENCE: &str = "accounts";
pub const EXPIRATION_TIME: u64 = 60 * 60; // 1 hour.

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the JWT is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
}

/// Manage JWT tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    name: String,
    audience: String,
    expiration: u64,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    ///
    /// EC keys (ES256) are used when both PEM are set, otherwise the shared
    /// secret (HS256).
    pub fn new(name: &str, config: &TokenConfig) -> Result<Self> {
        let (algorithm, encoding_key, decoding_key) = match (
            &config.public_key_pem,
            &config.private_key_pem,
            &config.secret,
        ) {
            (Some(public_key), Some(private_key), _) => (
                Algorithm::ES256,
                EncodingKey::from_ec_pem(private_key.as_bytes())?,
                DecodingKey::from_ec_pem(public_key.as_bytes())?,
            ),
            (_, _, Some(secret)) if !secret.is_empty() => (
                Algorithm::HS256,
                EncodingKey::from_secret(secret.as_bytes()),
                DecodingKey::from_secret(secret.as_bytes()),
            ),
            _ => {
                return Err(ServerError::internal(
                    "`token` entry needs a `secret` or a pair of PEM keys",
                ));
            },
        };

        Ok(Self {
            algorithm,
            decoding_key,
            encoding_key,
            name: name.to_owned(),
            audience: config
                .audience
                .clone()
                .unwrap_or_else(|| DEFAULT_AUDIENCE.to_owned()),
            expiration: config.expiration.unwrap_or(EXPIRATION_TIME),
        })
    }

    /// Token lifetime, in seconds.
    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    /// Create a new [`jsonwebtoken`].
    pub fn create(&self, user_id: &str) -> Result<String> {
        let time = chrono::Utc::now().timestamp().max(0) as u64;
        let header = Header::new(self.algorithm);
        let claims = Claims {
            aud: self.audience.clone(),
            exp: time + self.expiration,
            iat: time,
            iss: self.name.clone(),
            sub: user_id.to_owned(),
        };

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// Decode and check a token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.name]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected token");
                ServerError::Unauthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str) -> TokenManager {
        TokenManager::new(
            "http://localhost:8888/",
            &TokenConfig {
                secret: Some(secret.to_owned()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_decode() {
        let token = manager("secret");

        let jwt = token.create("42").unwrap();
        let claims = token.decode(&jwt).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.aud, DEFAULT_AUDIENCE);
        assert_eq!(claims.exp, claims.iat + EXPIRATION_TIME);
    }

    #[test]
    fn test_reject_foreign_token() {
        let jwt = manager("secret").create("42").unwrap();

        assert!(matches!(
            manager("other").decode(&jwt),
            Err(ServerError::Unauthenticated)
        ));
        assert!(matches!(
            manager("secret").decode("not.a.jwt"),
            Err(ServerError::Unauthenticated)
        ));
    }

    #[test]
    fn test_missing_key() {
        let result = TokenManager::new("x", &TokenConfig::default());
        assert!(matches!(result, Err(ServerError::Internal { .. })));
    }
}
