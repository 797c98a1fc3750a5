use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Identity
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: usize, // Expiration timestamp
}

/// HS256 signing and verification keys derived from the configured secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Sign a token for `identity`, valid for `ttl`.
pub fn sign(keys: &JwtKeys, identity: &str, roles: &[&str], ttl: Duration) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .context("token expiry out of range")?
        .timestamp();

    let claims = Claims {
        sub: identity.to_owned(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        exp: usize::try_from(expiration).context("token expiry before epoch")?,
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;
    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(keys: &JwtKeys, token: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::HS256))?;
    Ok(token_data.claims)
}
