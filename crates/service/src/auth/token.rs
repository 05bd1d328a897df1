use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::Deserialize;

use super::domain::Claims;
use super::errors::{AuthError, Denial};
use super::keys::{PrivateKey, PublicKey};

pub const ISSUER: &str = "anwil";
pub const EXPIRATION_DAYS: i64 = 30;

const SIGN_METHOD: &str = "EdDSA";

/// Only the algorithm of a token header, kept as written.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Reads `alg` without restricting it to the algorithms jsonwebtoken knows.
fn sign_method(token: &str) -> Result<String, AuthError> {
    let segment = token.split('.').next().unwrap_or_default();
    let json = general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::Token(JwtErrorKind::InvalidToken.into()))?;
    let header: RawHeader =
        serde_json::from_slice(&json).map_err(|err| AuthError::Token(JwtError::from(err)))?;
    Ok(header.alg)
}

/// Stamps issuer and validity window on `claims` and signs them.
///
/// `key` must be the 64-byte seed-plus-public-key form.
pub fn generate(claims: &mut Claims, key: &[u8]) -> Result<String, AuthError> {
    let key = PrivateKey::from_bytes(key)?;
    sign(claims, &key)
}

/// Same as [`generate`] for an already validated key.
pub fn sign(claims: &mut Claims, key: &PrivateKey) -> Result<String, AuthError> {
    let now = Utc::now();
    claims.iss = Some(ISSUER.to_string());
    claims.iat = Some(now.timestamp());
    claims.exp = Some((now + Duration::days(EXPIRATION_DAYS)).timestamp());

    encode(&Header::new(Algorithm::EdDSA), &*claims, &key.encoding_key()).map_err(AuthError::Token)
}

/// Verifies the signature and time claims of `token` and returns its payload.
pub fn validate(token: &str, key: &PublicKey) -> Result<Claims, AuthError> {
    let alg = sign_method(token)?;
    if alg != SIGN_METHOD {
        return Err(Denial::UnexpectedSignMethod(alg).into());
    }

    let mut validation = Validation::new(Algorithm::EdDSA);
    // exp and nbf are still checked when present
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &key.decoding_key(), &validation)
        .map(|data| data.claims)
        .map_err(|err| {
            let rejected = matches!(
                err.kind(),
                JwtErrorKind::InvalidSignature
                    | JwtErrorKind::ExpiredSignature
                    | JwtErrorKind::ImmatureSignature
                    | JwtErrorKind::InvalidAlgorithm
            );
            if rejected {
                Denial::Token(err).into()
            } else {
                AuthError::Token(err)
            }
        })
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::EncodingKey;

    use super::*;

    const KEY: &str = "e3de69265ea200c17633b8b7ba90c17c15e96f3f1d0ad608d9f628e515c7e53b\
                       d6507afe638ea0565709842d869581edfc5e5b6186a8215f6bed2504991ff9fb";
    const OTHER_KEY: &str = "27a2fd4868ca3c71dbecfb8f89c75f48de642d95f4efbfe47bf401b78935b078\
                             6ec428ede4c0d6cba5d12fe166c67b660177f879a4bb750ee67dceec1b624eee";
    // {"username":"random-username"}, no registered claims
    const TOKEN: &str = "eyJhbGciOiJFZERTQSIsInR5cCI6IkpXVCJ9.\
                         eyJ1c2VybmFtZSI6InJhbmRvbS11c2VybmFtZSJ9.\
                         nVxpOGoHA9cggY3yGY9RJdZLYdPYnkBTClfG5HTLtLA4uEUKz5tdjlKvGHr0DkT9AVq1tiaC1SxC1ICcV4wECg";

    fn key() -> PrivateKey {
        PrivateKey::from_hex(KEY).unwrap()
    }

    #[test]
    fn generate_and_validate() {
        let key = key();
        let mut claims = Claims::for_user("random-username");
        let token = generate(&mut claims, key.as_bytes()).unwrap();

        let decoded = validate(&token, &key.public_key()).unwrap();
        assert_eq!(decoded.username, "random-username");
        assert_eq!(decoded.iss.as_deref(), Some(ISSUER));
        assert_eq!(decoded, claims);
    }

    #[test]
    fn expiry_is_thirty_days() {
        let mut claims = Claims::default();
        generate(&mut claims, key().as_bytes()).unwrap();
        let (iat, exp) = (claims.iat.unwrap(), claims.exp.unwrap());
        assert_eq!(exp - iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn empty_claims_still_sign() {
        let token = generate(&mut Claims::default(), key().as_bytes()).unwrap();
        assert!(!token.is_empty());
    }

    #[test]
    fn invalid_key_size() {
        let err = generate(&mut Claims::default(), &[]).unwrap_err();
        assert!(matches!(err, AuthError::InvalidPrivateKeySize { actual: 0, .. }));
    }

    #[test]
    fn fixed_token_validates() {
        let claims = validate(TOKEN, &key().public_key()).unwrap();
        assert_eq!(claims.username, "random-username");
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn wrong_public_key() {
        let other = hex::decode(OTHER_KEY).unwrap();
        let public = PublicKey::from_slice(&other[32..]).unwrap();

        let err = validate(TOKEN, &public).unwrap_err();
        match err {
            AuthError::Unauthorized(Denial::Token(inner)) => {
                assert!(matches!(inner.kind(), JwtErrorKind::InvalidSignature))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unexpected_algorithm() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &Claims::default(),
            &EncodingKey::from_secret(key().as_bytes()),
        )
        .unwrap();

        let err = validate(&token, &key().public_key()).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Unauthorized(Denial::UnexpectedSignMethod(ref alg)) if alg == "HS512"
        ));
    }

    #[test]
    fn unsigned_token_rejected() {
        // {"alg":"none","typ":"JWT"}
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJ1c2VybmFtZSI6InJhbmRvbS11c2VybmFtZSJ9.";

        let err = validate(token, &key().public_key()).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Unauthorized(Denial::UnexpectedSignMethod(ref alg)) if alg == "none"
        ));
        assert_eq!(err.kind(), crate::errors::ErrorKind::Unauthorized);
    }

    #[test]
    fn caller_registered_claims_overwritten() {
        let key = key();
        let mut claims = Claims {
            username: "wisher".into(),
            iss: Some("evil".into()),
            iat: Some(0),
            exp: Some(i64::MAX),
        };
        let before = Utc::now().timestamp();
        let token = generate(&mut claims, key.as_bytes()).unwrap();

        for claims in [claims.clone(), validate(&token, &key.public_key()).unwrap()] {
            let (iat, exp) = (claims.iat.unwrap(), claims.exp.unwrap());
            assert_eq!(claims.iss.as_deref(), Some(ISSUER));
            assert!((before..=before + 5).contains(&iat), "iat {iat}");
            assert_eq!(exp - iat, EXPIRATION_DAYS * 24 * 60 * 60);
        }
    }

    #[test]
    fn expired_token() {
        let key = key();
        let claims = Claims {
            username: "late".into(),
            exp: Some(Utc::now().timestamp() - 3600),
            ..Claims::default()
        };
        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &key.encoding_key()).unwrap();

        let err = validate(&token, &key.public_key()).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn garbage_is_not_unauthorized() {
        let err = validate("definitely.not.a-token", &key().public_key()).unwrap_err();
        assert!(matches!(err, AuthError::Token(_)));
    }
}
