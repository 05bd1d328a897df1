use std::any::{Any, TypeId};
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use super::domain::{Visibility, Wish, Wishlist};
use super::repo::seaorm::SeaOrmWishRepository;
use super::repository::memory::InMemoryWishRepository;
use super::repository::WishRepository;
use crate::capabilities::{self, Logger, Storage};
use crate::errors::ServiceError;
use crate::lifecycle::{
    inject_service_with, Consumer, InitContext, Provider, ServiceDefinition, ServiceId,
    ServiceInstance, Slot,
};
use crate::users::USERS_SERVICE;

pub const WISHES_SERVICE: ServiceId = ServiceId::from_static("wishes");

/// Wishlists of a wisher and the wishes in them.
pub struct WishesService {
    repo: Arc<dyn WishRepository>,
    span: Span,
}

impl WishesService {
    pub fn new(repo: Arc<dyn WishRepository>, span: Span) -> Self {
        Self { repo, span }
    }

    /// Creates an empty wishlist after the wisher's existing ones.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::wishes::{repository::memory::InMemoryWishRepository, Visibility, WishesService};
    /// let wishes = WishesService::new(Arc::new(InMemoryWishRepository::default()), tracing::Span::none());
    /// let wisher = uuid::Uuid::new_v4();
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// rt.block_on(wishes.create_wishlist(wisher, "birthday", Visibility::Public)).unwrap();
    /// assert!(rt.block_on(wishes.create_wishlist(wisher, "birthday", Visibility::Private)).is_err());
    /// ```
    #[instrument(parent = &self.span, skip(self))]
    pub async fn create_wishlist(
        &self,
        wisher: Uuid,
        name: &str,
        visibility: Visibility,
    ) -> Result<(), ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("wishlist name required".into()));
        }
        if self.repo.find_wishlist(wisher, name).await?.is_some() {
            debug!("wishlist exists");
            return Err(ServiceError::Conflict(format!("wishlist {name} already exists")));
        }

        let created = self.repo.insert_wishlist(wisher, name, visibility).await?;
        info!(uuid = %created.uuid, position = created.position, "wishlist_created");
        Ok(())
    }

    /// Every wishlist of `wisher` with its wishes.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn list_wishlists(&self, wisher: Uuid) -> Result<Vec<Wishlist>, ServiceError> {
        let wishlists = self.repo.list_wishlists(wisher).await?;
        let mut result = Vec::with_capacity(wishlists.len());
        for wishlist in wishlists {
            result.push(Wishlist {
                wishes: self.list_wishes(wishlist.uuid).await?,
                name: wishlist.name,
                visibility: wishlist.visibility,
            });
        }
        Ok(result)
    }

    #[instrument(parent = &self.span, skip(self))]
    pub async fn delete_wishlist(&self, wisher: Uuid, name: &str) -> Result<(), ServiceError> {
        self.repo.delete_wishlist(wisher, name).await?;
        info!("wishlist_deleted");
        Ok(())
    }

    /// Adds a wish to the wishlist; returns the new wish id.
    #[instrument(parent = &self.span, skip(self, description))]
    pub async fn create_wish(
        &self,
        wishlist: Uuid,
        description: &str,
        position: i32,
    ) -> Result<Uuid, ServiceError> {
        let uuid = self.repo.insert_wish(wishlist, description, position).await?;
        debug!(%uuid, "wish_created");
        Ok(uuid)
    }

    pub async fn list_wishes(&self, wishlist: Uuid) -> Result<Vec<Wish>, ServiceError> {
        let wishes = self.repo.list_wishes(wishlist).await?;
        Ok(wishes.into_iter().map(Wish::from).collect())
    }

    /// Id of a wishlist by owner and name.
    pub async fn wishlist_id(&self, wisher: Uuid, name: &str) -> Result<Uuid, ServiceError> {
        self.repo
            .find_wishlist(wisher, name)
            .await?
            .map(|wishlist| wishlist.uuid)
            .ok_or_else(|| ServiceError::not_found("wishlist"))
    }
}

#[derive(Default)]
struct Wiring {
    logger: Slot<Logger>,
    storage: Slot<Storage>,
}

impl Consumer for Wiring {
    fn slot(&mut self, capability: TypeId) -> Option<&mut dyn Any> {
        self.logger
            .claim(capability)
            .or_else(|| self.storage.claim(capability))
    }
}

fn repository(storage: DatabaseConnection) -> Arc<dyn WishRepository> {
    match storage {
        DatabaseConnection::Disconnected => {
            warn!("no database connection, wishlists are kept in memory");
            Arc::new(InMemoryWishRepository::default())
        }
        db => Arc::new(SeaOrmWishRepository::new(db)),
    }
}

/// The wishes service: wishlists belong to wishers, so it runs after users.
pub fn definition<S: Provider + ?Sized + 'static>() -> ServiceDefinition<S> {
    ServiceDefinition::new(WISHES_SERVICE, |ctx: &InitContext<'_, S>| {
        let mut wiring = Wiring::default();
        inject_service_with(
            &mut wiring,
            ctx,
            &[capabilities::storage::inject, capabilities::logger::inject],
        )?;

        let span = wiring.logger.take()?;
        let repo = {
            let _entered = span.enter();
            repository(wiring.storage.take()?)
        };
        Ok(ServiceInstance::new(WishesService::new(repo, span)))
    })
    .with_dependencies([USERS_SERVICE])
}
