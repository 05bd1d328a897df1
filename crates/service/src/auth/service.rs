use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use configs::AppConfig;
use tracing::{debug, warn, Span};

use super::domain::Claims;
use super::errors::AuthError;
use super::keys::{PrivateKey, PublicKey};
use super::{password, token};
use crate::capabilities::{self, Authentication, Config, Logger};
use crate::lifecycle::{
    inject_service_with, offer, Consumer, InitContext, Provider, ServiceDefinition, ServiceId,
    ServiceInstance, Slot,
};

pub const AUTH_SERVICE: ServiceId = ServiceId::from_static("auth");

/// Password digests and token signing, all keyed by one Ed25519 private key.
///
/// Cloning is cheap; clones share the key.
#[derive(Clone)]
pub struct AuthService {
    key: Arc<PrivateKey>,
    span: Span,
}

impl AuthService {
    pub fn new(key: PrivateKey, span: Span) -> Self {
        Self {
            key: Arc::new(key),
            span,
        }
    }

    /// Loads the key from `auth.private_key_path`, or generates an ephemeral
    /// one when the path is not set.
    pub fn from_config(config: &AppConfig, span: Span) -> Result<Self, AuthError> {
        let key = {
            let _entered = span.enter();
            match config.auth.private_key_path.as_deref() {
                Some(path) if !path.trim().is_empty() => PrivateKey::load(path)?,
                _ => {
                    warn!("no private key configured, tokens will not survive a restart");
                    PrivateKey::generate()
                }
            }
        };
        Ok(Self::new(key, span))
    }

    /// Hex digest of `password` to be stored instead of the password itself.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, PrivateKey};
    /// let auth = AuthService::new(PrivateKey::generate(), tracing::Span::none());
    /// let digest = auth.encrypt_password("truly-random-password").unwrap();
    /// assert_eq!(digest.len(), 128);
    /// assert!(auth.validate_password("truly-random-password", &digest).is_ok());
    /// ```
    pub fn encrypt_password(&self, password: &str) -> Result<String, AuthError> {
        password::encrypt(password, self.key.as_bytes())
    }

    pub fn validate_password(&self, input: &str, encrypted: &str) -> Result<(), AuthError> {
        password::validate(input, encrypted, self.key.as_bytes())
    }

    pub fn generate_token(&self, claims: &mut Claims) -> Result<String, AuthError> {
        token::sign(claims, &self.key)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let _entered = self.span.enter();
        token::validate(token, &self.key.public_key()).map_err(|err| {
            debug!(error = %err, "token rejected");
            err
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Provider for AuthService {
    fn provide(&self, capability: TypeId) -> Option<Box<dyn Any + Send>> {
        offer::<Authentication>(capability, || self.clone())
    }
}

#[derive(Default)]
struct Wiring {
    config: Slot<Config>,
    logger: Slot<Logger>,
}

impl Consumer for Wiring {
    fn slot(&mut self, capability: TypeId) -> Option<&mut dyn Any> {
        self.config
            .claim(capability)
            .or_else(|| self.logger.claim(capability))
    }
}

/// The auth service: needs configuration and a logger, provides
/// [`Authentication`] to services initialized after it.
pub fn definition<S: Provider + ?Sized + 'static>() -> ServiceDefinition<S> {
    ServiceDefinition::new(AUTH_SERVICE, |ctx: &InitContext<'_, S>| {
        let mut wiring = Wiring::default();
        inject_service_with(
            &mut wiring,
            ctx,
            &[capabilities::config::inject, capabilities::logger::inject],
        )?;

        let span = wiring.logger.take()?;
        let service = AuthService::from_config(wiring.config.get()?, span)?;
        debug!(public_key = %service.public_key().to_hex(), "auth service ready");
        Ok(ServiceInstance::providing(service))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::Denial;
    use crate::lifecycle::{initialize, Capability, InjectError};

    fn auth() -> AuthService {
        AuthService::new(PrivateKey::generate(), Span::none())
    }

    #[test]
    fn password_round_trip() {
        let auth = auth();
        let encrypted = auth.encrypt_password("truly-random-password").unwrap();
        auth.validate_password("truly-random-password", &encrypted).unwrap();

        let err = auth.validate_password("truly-random-passwort", &encrypted).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(Denial::InvalidPassword)));
    }

    #[test]
    fn token_round_trip() {
        let auth = auth();
        let token = auth.generate_token(&mut Claims::for_user("wisher")).unwrap();
        assert_eq!(auth.validate_token(&token).unwrap().username, "wisher");
    }

    #[test]
    fn tokens_from_other_keys_rejected() {
        let token = auth().generate_token(&mut Claims::for_user("wisher")).unwrap();
        assert!(auth().validate_token(&token).unwrap_err().is_unauthorized());
    }

    #[test]
    fn key_loaded_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.key");
        let key = PrivateKey::generate();
        key.save(&path).unwrap();

        let mut config = AppConfig::default();
        config.auth.private_key_path = Some(path.display().to_string());

        let auth = AuthService::from_config(&config, Span::none()).unwrap();
        assert_eq!(auth.public_key(), key.public_key());
    }

    #[test]
    fn missing_key_file_fails() {
        let mut config = AppConfig::default();
        config.auth.private_key_path = Some("/definitely/not/here.key".into());
        let err = AuthService::from_config(&config, Span::none()).unwrap_err();
        assert!(matches!(err, AuthError::KeyFile { .. }));
    }

    #[test]
    fn provides_authentication() {
        let auth = auth();
        let provided = auth
            .provide(Authentication::id())
            .and_then(|value| value.downcast::<AuthService>().ok())
            .unwrap();
        assert_eq!(provided.public_key(), auth.public_key());
        assert!(auth.provide(Config::id()).is_none());
    }

    struct Configured(Arc<AppConfig>);

    impl Provider for Configured {
        fn provide(&self, capability: TypeId) -> Option<Box<dyn Any + Send>> {
            offer::<Config>(capability, || self.0.clone())
                .or_else(|| offer::<Logger>(capability, Span::none))
        }
    }

    #[test]
    fn initializes_from_state() {
        let state = Configured(Arc::new(AppConfig::default()));
        let mapping = initialize(&state, &[definition()]).unwrap();
        assert!(mapping.get::<AuthService>(&AUTH_SERVICE).is_ok());
    }

    struct Empty;

    impl Provider for Empty {
        fn provide(&self, _: TypeId) -> Option<Box<dyn Any + Send>> {
            None
        }
    }

    #[test]
    fn fails_without_config() {
        let err = initialize(&Empty, &[definition()]).unwrap_err();
        let source = std::error::Error::source(&err).unwrap();
        assert!(matches!(
            source.downcast_ref::<InjectError>(),
            Some(InjectError::NotProvided { capability: "configuration" })
        ));
    }
}
