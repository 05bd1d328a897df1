use std::any::{Any, TypeId};
use std::sync::Arc;

use configs::AppConfig;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use super::domain::{Credentials, NewUser, User};
use super::repo::seaorm::SeaOrmUserRepository;
use super::repository::memory::InMemoryUserRepository;
use super::repository::UserRepository;
use crate::auth::{AuthService, Claims, AUTH_SERVICE};
use crate::capabilities::{self, Authentication, Config, Logger, Storage};
use crate::errors::ServiceError;
use crate::lifecycle::{
    inject_service_with, Consumer, InitContext, Provider, ServiceDefinition, ServiceId,
    ServiceInstance, Slot,
};

pub const USERS_SERVICE: ServiceId = ServiceId::from_static("users");

/// Registration, lookup and token issuance for wishers.
pub struct UsersService {
    repo: Arc<dyn UserRepository>,
    auth: AuthService,
    config: Arc<AppConfig>,
    span: Span,
}

impl UsersService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        auth: AuthService,
        config: Arc<AppConfig>,
        span: Span,
    ) -> Self {
        Self { repo, auth, config, span }
    }

    fn check_requirements(&self, user: &NewUser) -> Result<(), ServiceError> {
        if user.username.trim().is_empty() {
            return Err(ServiceError::Validation("username required".into()));
        }
        let policy = &self.config.auth;
        let length = user.password.chars().count();
        if length < policy.min_password_length {
            return Err(ServiceError::Validation(format!(
                "password too short (>={})",
                policy.min_password_length
            )));
        }
        if length > policy.max_password_length {
            return Err(ServiceError::Validation(format!(
                "password too long (<={})",
                policy.max_password_length
            )));
        }
        Ok(())
    }

    /// Register a new user; the password is stored as a keyed digest.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, PrivateKey};
    /// use service::users::{domain::NewUser, repository::memory::InMemoryUserRepository, UsersService};
    /// let auth = AuthService::new(PrivateKey::generate(), tracing::Span::none());
    /// let users = UsersService::new(
    ///     Arc::new(InMemoryUserRepository::default()),
    ///     auth,
    ///     Arc::new(configs::AppConfig::default()),
    ///     tracing::Span::none(),
    /// );
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// let input = NewUser { username: "wisher".into(), password: "Secret123".into(), full_name: "W".into() };
    /// let user = rt.block_on(users.save_user(input)).unwrap();
    /// assert_eq!(user.username, "wisher");
    /// assert_ne!(user.password, "Secret123");
    /// ```
    #[instrument(parent = &self.span, skip(self, user), fields(username = %user.username))]
    pub async fn save_user(&self, user: NewUser) -> Result<User, ServiceError> {
        self.check_requirements(&user)?;
        let password = self.auth.encrypt_password(&user.password)?;

        if self.repo.find_by_username(&user.username).await?.is_some() {
            debug!("user exists");
            return Err(ServiceError::Conflict(format!("user {} already exists", user.username)));
        }

        let created = self
            .repo
            .insert(User {
                uuid: Uuid::new_v4(),
                username: user.username,
                password,
                full_name: user.full_name,
            })
            .await?;
        info!(uuid = %created.uuid, "user_registered");
        Ok(created)
    }

    #[instrument(parent = &self.span, skip(self))]
    pub async fn get_user(&self, username: &str) -> Result<User, ServiceError> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))
    }

    /// Checks the credentials and issues a token carrying the username.
    #[instrument(parent = &self.span, skip(self, credentials), fields(username = %credentials.username))]
    pub async fn generate_user_token(&self, credentials: Credentials) -> Result<String, ServiceError> {
        let existing = self.get_user(&credentials.username).await?;
        self.auth
            .validate_password(&credentials.password, &existing.password)?;

        let token = self
            .auth
            .generate_token(&mut Claims::for_user(existing.username))?;
        debug!("token issued");
        Ok(token)
    }

    pub async fn validate_user_token(&self, token: &str) -> Result<Claims, ServiceError> {
        Ok(self.auth.validate_token(token)?)
    }
}

#[derive(Default)]
struct Wiring {
    config: Slot<Config>,
    logger: Slot<Logger>,
    storage: Slot<Storage>,
    auth: Slot<Authentication>,
}

impl Consumer for Wiring {
    fn slot(&mut self, capability: TypeId) -> Option<&mut dyn Any> {
        self.config
            .claim(capability)
            .or_else(|| self.logger.claim(capability))
            .or_else(|| self.storage.claim(capability))
            .or_else(|| self.auth.claim(capability))
    }
}

fn repository(storage: DatabaseConnection) -> Arc<dyn UserRepository> {
    match storage {
        DatabaseConnection::Disconnected => {
            warn!("no database connection, users are kept in memory");
            Arc::new(InMemoryUserRepository::default())
        }
        db => Arc::new(SeaOrmUserRepository::new(db)),
    }
}

/// The users service: runs after auth and needs every capability.
pub fn definition<S: Provider + ?Sized + 'static>() -> ServiceDefinition<S> {
    ServiceDefinition::new(USERS_SERVICE, |ctx: &InitContext<'_, S>| {
        let mut wiring = Wiring::default();
        inject_service_with(
            &mut wiring,
            ctx,
            &[
                capabilities::config::inject,
                capabilities::logger::inject,
                capabilities::storage::inject,
                capabilities::auth::inject,
            ],
        )?;

        let span = wiring.logger.take()?;
        let repo = {
            let _entered = span.enter();
            repository(wiring.storage.take()?)
        };
        let service = UsersService::new(repo, wiring.auth.take()?, wiring.config.take()?, span);
        Ok(ServiceInstance::new(service))
    })
    .with_dependencies([AUTH_SERVICE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, Denial, PrivateKey};
    use crate::errors::ErrorKind;

    fn users() -> UsersService {
        UsersService::new(
            Arc::new(InMemoryUserRepository::default()),
            AuthService::new(PrivateKey::generate(), Span::none()),
            Arc::new(AppConfig::default()),
            Span::none(),
        )
    }

    fn wisher() -> NewUser {
        NewUser {
            username: "wisher".into(),
            password: "truly-random-password".into(),
            full_name: "Wendy Wisher".into(),
        }
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "wisher".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_token_round_trip() {
        let users = users();
        let saved = users.save_user(wisher()).await.unwrap();
        assert_eq!(saved.full_name, "Wendy Wisher");
        assert_eq!(saved.password.len(), 128);

        let token = users
            .generate_user_token(credentials("truly-random-password"))
            .await
            .unwrap();
        let claims = users.validate_user_token(&token).await.unwrap();
        assert_eq!(claims.username, "wisher");
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let users = users();
        users.save_user(wisher()).await.unwrap();
        let err = users.save_user(wisher()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn wrong_password_unauthorized() {
        let users = users();
        users.save_user(wisher()).await.unwrap();
        let err = users
            .generate_user_token(credentials("truly-random-passwort"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Auth(AuthError::Unauthorized(Denial::InvalidPassword))
        ));
    }

    #[tokio::test]
    async fn unknown_user_not_found() {
        let users = users();
        let err = users.get_user("nobody").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = users
            .generate_user_token(credentials("whatever-password"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn password_requirements() {
        let users = users();
        let long = "x".repeat(73);
        for password in ["", "short", long.as_str()] {
            let input = NewUser {
                password: password.to_string(),
                ..wisher()
            };
            let err = users.save_user(input).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{password:?}");
        }

        let err = users
            .save_user(NewUser { username: " ".into(), ..wisher() })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn stored_password_is_not_plaintext() {
        let users = users();
        users.save_user(wisher()).await.unwrap();
        let stored = users.get_user("wisher").await.unwrap();
        assert_ne!(stored.password, "truly-random-password");

        let json = serde_json::to_value(&stored).unwrap();
        assert!(json.get("password").is_none());
    }
}
