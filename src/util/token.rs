//! Session token issuance and verification.
//!
//! Tokens are stateless JWTs: the payload is flattened next to `iat`/`exp`
//! and validity is decided only by signature and expiry at verification time.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::settings::JwtSettings;
use crate::domain::Role;

pub const DEFAULT_VALIDITY_SECS: u64 = 7 * 24 * 60 * 60;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Claims<P> {
    #[serde(flatten)]
    pub payload: P,
    pub iat: i64,
    pub exp: i64,
}

/// Identity carried by session tokens issued at login.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct SessionIdentity {
    pub sub: String,
    pub email: String,
    pub username: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct TokenConfig {
    pub algorithm: Algorithm,
    pub validity_secs: u64,
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token generation failed: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("token validation failed: {0}")]
    Decode(jsonwebtoken::errors::Error),
    #[error("invalid token configuration: {0}")]
    Config(String),
}

impl TokenConfig {
    pub fn hs256(secret: &[u8], validity_secs: u64) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            validity_secs,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self, TokenError> {
        let validity_secs = if settings.validity_secs == 0 {
            DEFAULT_VALIDITY_SECS
        } else {
            settings.validity_secs
        };

        match settings.algorithm.to_uppercase().as_str() {
            "HS256" => {
                let secret = settings
                    .secret
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| TokenError::Config("jwt.secret is required for HS256".into()))?;
                Ok(Self::hs256(secret.as_bytes(), validity_secs))
            }
            "RS256" => {
                let private = settings
                    .private_key
                    .as_deref()
                    .ok_or_else(|| TokenError::Config("jwt.private_key is required for RS256".into()))?;
                let public = settings
                    .public_key
                    .as_deref()
                    .ok_or_else(|| TokenError::Config("jwt.public_key is required for RS256".into()))?;
                Ok(Self {
                    algorithm: Algorithm::RS256,
                    validity_secs,
                    encoding_key: EncodingKey::from_rsa_pem(private.as_bytes())
                        .map_err(|e| TokenError::Config(e.to_string()))?,
                    decoding_key: DecodingKey::from_rsa_pem(public.as_bytes())
                        .map_err(|e| TokenError::Config(e.to_string()))?,
                })
            }
            other => Err(TokenError::Config(format!("unsupported algorithm {other}"))),
        }
    }
}

/// Signs `payload` valid for `validity`, or the configured window when absent.
pub fn issue_token<P: Serialize>(
    config: &TokenConfig,
    payload: &P,
    validity: Option<Duration>,
) -> Result<String, TokenError> {
    issue_token_at(config, payload, validity, Utc::now().timestamp())
}

pub fn issue_token_at<P: Serialize>(
    config: &TokenConfig,
    payload: &P,
    validity: Option<Duration>,
    issued_at: i64,
) -> Result<String, TokenError> {
    let validity_secs = validity
        .map(|d| d.as_secs())
        .unwrap_or(config.validity_secs);
    let validity_secs = i64::try_from(validity_secs).unwrap_or(i64::MAX);
    let claims = Claims {
        payload,
        iat: issued_at,
        exp: issued_at.saturating_add(validity_secs),
    };
    jsonwebtoken::encode(&Header::new(config.algorithm), &claims, &config.encoding_key)
        .map_err(TokenError::Encode)
}

/// Returns the claims of a well-signed, unexpired token and `None` otherwise.
pub fn verify_token<P: DeserializeOwned>(config: &TokenConfig, token: &str) -> Option<Claims<P>> {
    match decode_claims(config, token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            tracing::debug!(error = %err, "session token rejected");
            None
        }
    }
}

fn decode_claims<P: DeserializeOwned>(
    config: &TokenConfig,
    token: &str,
) -> Result<Claims<P>, TokenError> {
    let mut validation = Validation::new(config.algorithm);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);
    jsonwebtoken::decode::<Claims<P>>(token, &config.decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(TokenError::Decode)
}

pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix(BEARER_PREFIX)
}
