use hmac::{Hmac, Mac};
use sha2::Sha512;

use super::errors::{AuthError, Denial};

type HmacSha512 = Hmac<Sha512>;

fn mac(key: &[u8]) -> Result<HmacSha512, AuthError> {
    if key.is_empty() {
        return Err(AuthError::MissingKey);
    }
    HmacSha512::new_from_slice(key).map_err(|_| AuthError::MissingKey)
}

/// Hex-encoded HMAC-SHA512 of `password` keyed with `key`.
pub fn encrypt(password: &str, key: &[u8]) -> Result<String, AuthError> {
    let mut mac = mac(key)?;
    mac.update(password.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `input` against a digest produced by [`encrypt`] in constant time.
pub fn validate(input: &str, encrypted: &str, key: &[u8]) -> Result<(), AuthError> {
    let mut mac = mac(key)?;
    let expected = hex::decode(encrypted).map_err(|_| AuthError::MalformedDigest)?;
    mac.update(input.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| AuthError::Unauthorized(Denial::InvalidPassword))
}
