use std::fmt;
use std::fs;
use std::path::Path;

use ed25519_dalek::SigningKey;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use tracing::debug;

use super::errors::AuthError;

/// Seed followed by the public key, as stored on disk.
pub const PRIVATE_KEY_SIZE: usize = 64;
pub const PUBLIC_KEY_SIZE: usize = 32;

// PKCS#8 v2 (RFC 8410) framing around the seed and the public key.
const PKCS8_HEADER: [u8; 16] = [
    0x30, 0x53, 0x02, 0x01, 0x01, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];
const PKCS8_PUBLIC_HEADER: [u8; 5] = [0xa1, 0x23, 0x03, 0x21, 0x00];

/// Ed25519 verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AuthError> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            AuthError::InvalidKey(format!(
                "public key must be {PUBLIC_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_ed_der(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

/// Ed25519 signing key; also the HMAC key for password digests.
#[derive(Clone)]
pub struct PrivateKey {
    bytes: [u8; PRIVATE_KEY_SIZE],
}

impl PrivateKey {
    /// Fresh random key pair from the OS RNG.
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        Self {
            bytes: signing.to_keypair_bytes(),
        }
    }

    /// Accepts exactly 64 bytes whose trailing half is the public key of the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        let bytes: [u8; PRIVATE_KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| AuthError::InvalidPrivateKeySize {
                    expected: PRIVATE_KEY_SIZE,
                    actual: bytes.len(),
                })?;
        SigningKey::from_keypair_bytes(&bytes).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self { bytes })
    }

    pub fn from_hex(encoded: &str) -> Result<Self, AuthError> {
        let bytes = hex::decode(encoded.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Reads a hex-encoded key file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let encoded = fs::read_to_string(path).map_err(|source| AuthError::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let key = Self::from_hex(&encoded)?;
        debug!(path = %path.display(), "private key loaded");
        Ok(key)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AuthError> {
        let path = path.as_ref();
        fs::write(path, self.to_hex()).map_err(|source| AuthError::KeyFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        let mut public = [0u8; PUBLIC_KEY_SIZE];
        public.copy_from_slice(&self.bytes[PRIVATE_KEY_SIZE - PUBLIC_KEY_SIZE..]);
        PublicKey(public)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_ed_der(&self.pkcs8_der())
    }

    fn pkcs8_der(&self) -> Vec<u8> {
        let (seed, public) = self.bytes.split_at(PRIVATE_KEY_SIZE - PUBLIC_KEY_SIZE);
        let mut der = Vec::with_capacity(85);
        der.extend_from_slice(&PKCS8_HEADER);
        der.extend_from_slice(seed);
        der.extend_from_slice(&PKCS8_PUBLIC_HEADER);
        der.extend_from_slice(public);
        der
    }
}

impl AsRef<[u8]> for PrivateKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}
