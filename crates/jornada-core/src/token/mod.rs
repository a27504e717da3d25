//! Session tokens for the HTTP surface.
//!
//! Tokens are HMAC-SHA256 over the user id.
//! Format: `jornada_st_<user_id>_<hmac_hex>`

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "jornada_st_";

/// Length of a hyphenated UUID.
const UUID_LEN: usize = 36;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("missing session secret")]
    MissingSecret,

    #[error("session secret is unusable as an HMAC key")]
    InvalidKey,
}

/// Secret used to sign and verify session tokens.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: Vec<u8>,
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Build from a hex-encoded secret, as stored in the config file.
    pub fn from_hex(secret_hex: &str) -> Result<Self, TokenError> {
        if secret_hex.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let secret = hex::decode(secret_hex)
            .map_err(|e| TokenError::InvalidFormat(format!("session secret is not valid hex: {e}")))?;
        Ok(Self::new(secret))
    }

    /// Read the hex secret from `JORNADA_SESSION_SECRET`.
    pub fn from_env() -> Result<Self, TokenError> {
        let secret_hex =
            std::env::var("JORNADA_SESSION_SECRET").map_err(|_| TokenError::MissingSecret)?;
        Self::from_hex(&secret_hex)
    }
}

/// Issue a session token for `user_id`.
pub fn generate_token(config: &TokenConfig, user_id: Uuid) -> Result<String, TokenError> {
    let mut mac = keyed_mac(&config.secret)?;
    mac.update(user_id.to_string().as_bytes());
    let hmac_hex = hex::encode(mac.finalize().into_bytes());
    Ok(format!("{TOKEN_PREFIX}{user_id}_{hmac_hex}"))
}

/// Verify a session token and return the user id it was issued for.
pub fn validate_token(config: &TokenConfig, token: &str) -> Result<Uuid, TokenError> {
    let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        TokenError::InvalidFormat(format!("token must start with '{TOKEN_PREFIX}'"))
    })?;
    if rest.len() < UUID_LEN || !rest.is_char_boundary(UUID_LEN) {
        return Err(TokenError::InvalidFormat(
            "token too short to contain a user id".to_string(),
        ));
    }
    let (id_str, after_id) = rest.split_at(UUID_LEN);
    let user_id =
        Uuid::parse_str(id_str).map_err(|e| TokenError::InvalidUserId(e.to_string()))?;

    let hmac_hex = after_id.strip_prefix('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore after user id".to_string())
    })?;
    let provided = hex::decode(hmac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;

    let mut mac = keyed_mac(&config.secret)?;
    mac.update(user_id.to_string().as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| TokenError::HmacMismatch)?;

    Ok(user_id)
}

fn keyed_mac(key: &[u8]) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(key).map_err(|_| TokenError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenConfig {
        TokenConfig::new(b"test-secret-key-for-jornada".to_vec())
    }

    #[test]
    fn token_has_prefix_id_and_sha256_hex() {
        let user_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let token = generate_token(&test_config(), user_id).unwrap();

        let rest = token.strip_prefix("jornada_st_").unwrap();
        assert!(rest.starts_with(&user_id.to_string()));
        assert_eq!(rest[37..].len(), 64);
    }

    #[test]
    fn issued_token_validates() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = generate_token(&config, user_id).unwrap();
        assert_eq!(validate_token(&config, &token).unwrap(), user_id);
    }

    #[test]
    fn reject_swapped_user_id() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = generate_token(&config, user_id).unwrap();
        let tampered = token.replace(&user_id.to_string(), &Uuid::new_v4().to_string());
        assert!(matches!(
            validate_token(&config, &tampered),
            Err(TokenError::HmacMismatch)
        ));
    }

    #[test]
    fn reject_wrong_secret() {
        let token = generate_token(&test_config(), Uuid::new_v4()).unwrap();
        let other = TokenConfig::new(b"another-secret".to_vec());
        assert!(matches!(
            validate_token(&other, &token),
            Err(TokenError::HmacMismatch)
        ));
    }

    #[test]
    fn reject_malformed_tokens() {
        let config = test_config();
        for bad in ["", "Bearer abc", "jornada_st_short", "jornada_st_not-a-valid-uuid-at-all-noooooo_ab"] {
            assert!(validate_token(&config, bad).is_err(), "{bad:?} should be rejected");
        }
        let id = Uuid::new_v4();
        assert!(matches!(
            validate_token(&config, &format!("jornada_st_{id}_zz")),
            Err(TokenError::InvalidFormat(_))
        ));
    }

    #[test]
    fn from_hex_decodes_and_rejects_garbage() {
        assert_eq!(TokenConfig::from_hex("00ff").unwrap().secret, vec![0x00, 0xff]);
        assert!(matches!(TokenConfig::from_hex(""), Err(TokenError::MissingSecret)));
        assert!(matches!(
            TokenConfig::from_hex("xyz"),
            Err(TokenError::InvalidFormat(_))
        ));
    }
}
