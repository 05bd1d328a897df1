use std::any::{Any, TypeId};
use std::sync::Arc;

use configs::AppConfig;
use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use tracing::{info, info_span, Span};

use crate::auth::{self, AuthService, AUTH_SERVICE};
use crate::capabilities::{Config, Logger, Storage};
use crate::lifecycle::{
    initialize, offer, InitError, LookupError, Provider, ServiceDefinition, ServiceMapping,
};
use crate::users::{self, UsersService, USERS_SERVICE};
use crate::wishes::{self, WishesService, WISHES_SERVICE};

/// Where the service batch of an [`AppState`] stands.
#[derive(Default)]
enum Services {
    #[default]
    Uninitialized,
    Initializing,
    Ready(ServiceMapping),
}

/// Application state: configuration, logger and storage shared with every
/// service, plus the services themselves once initialized.
pub struct AppState {
    config: Arc<AppConfig>,
    span: Span,
    storage: DatabaseConnection,
    services: RwLock<Services>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: DatabaseConnection) -> Self {
        Self {
            config: Arc::new(config),
            span: info_span!("wishlist"),
            storage,
            services: RwLock::new(Services::Uninitialized),
        }
    }

    /// Replaces the root span services log under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &DatabaseConnection {
        &self.storage
    }

    /// Every service the application runs.
    pub fn default_definitions() -> Vec<ServiceDefinition<AppState>> {
        vec![
            auth::service::definition(),
            users::service::definition(),
            wishes::service::definition(),
        ]
    }

    /// Initializes `definitions` against this state. Allowed once.
    ///
    /// The lock is only held to switch states, so init hooks may read the
    /// state; calling this again from a hook fails with `AlreadyInitialized`.
    /// A failed batch leaves the state uninitialized.
    pub fn init_services(&self, definitions: &[ServiceDefinition<AppState>]) -> Result<(), InitError> {
        {
            let mut services = self.services.write();
            if !matches!(*services, Services::Uninitialized) {
                return Err(InitError::AlreadyInitialized);
            }
            *services = Services::Initializing;
        }

        match initialize(self, definitions) {
            Ok(mapping) => {
                info!(parent: &self.span, services = ?mapping.ids(), "application services ready");
                *self.services.write() = Services::Ready(mapping);
                Ok(())
            }
            Err(err) => {
                *self.services.write() = Services::Uninitialized;
                Err(err)
            }
        }
    }

    pub fn init_default_services(&self) -> Result<(), InitError> {
        self.init_services(&Self::default_definitions())
    }

    /// Initialized services; empty until `init_services` has succeeded.
    pub fn services(&self) -> ServiceMapping {
        match &*self.services.read() {
            Services::Ready(mapping) => mapping.clone(),
            Services::Uninitialized | Services::Initializing => ServiceMapping::default(),
        }
    }

    pub fn authentication(&self) -> Result<Arc<AuthService>, LookupError> {
        self.services().get(&AUTH_SERVICE)
    }

    pub fn users(&self) -> Result<Arc<UsersService>, LookupError> {
        self.services().get(&USERS_SERVICE)
    }

    pub fn wishes(&self) -> Result<Arc<WishesService>, LookupError> {
        self.services().get(&WISHES_SERVICE)
    }
}

impl Provider for AppState {
    fn provide(&self, capability: TypeId) -> Option<Box<dyn Any + Send>> {
        offer::<Config>(capability, || self.config.clone())
            .or_else(|| offer::<Logger>(capability, || self.span.clone()))
            .or_else(|| offer::<Storage>(capability, || self.storage.clone()))
    }
}
