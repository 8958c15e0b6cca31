//! Agent store profile and the admin approval workflow.

use sqlx::PgPool;
use tracing::{info, instrument};

use bundlehub_core::{PhoneNumber, Slug, StoreId, StoreStatus, UserId};

use crate::db::StoreRepository;
use crate::db::stores::{NewStore, StoreChanges};
use crate::error::{AppError, Result};
use crate::models::Store;
use crate::services::logo;
use crate::services::orders::owned_store;

/// Longest store name.
const MAX_NAME_LEN: usize = 80;

/// Store creation form.
#[derive(Debug)]
pub struct StoreForm<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub contact_phone: &'a str,
}

/// Store edit form; missing fields stay unchanged.
#[derive(Debug, Default)]
pub struct StoreEdit<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
}

pub struct StoreService<'a> {
    stores: StoreRepository<'a>,
    pool: &'a PgPool,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
            pool,
        }
    }

    /// The agent's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the agent has no store yet.
    pub async fn for_owner(&self, owner: UserId) -> Result<Store> {
        owned_store(self.pool, owner).await
    }

    /// Open a store for review. An agent has at most one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for invalid fields and
    /// `AppError::Conflict` for a taken slug or a second store.
    #[instrument(skip(self, form), fields(slug = %form.slug))]
    pub async fn create(&self, owner: UserId, form: StoreForm<'_>) -> Result<Store> {
        let name = store_name(form.name)?;
        let slug = Slug::parse(form.slug)?;
        let contact_phone = PhoneNumber::parse(form.contact_phone)?;
        let description = form.description.map(str::trim).filter(|d| !d.is_empty());

        let store = self
            .stores
            .create(NewStore {
                owner_id: owner,
                name,
                slug: &slug,
                description,
                contact_phone: &contact_phone,
            })
            .await?;

        info!(store_id = %store.id, owner = %owner, "Store created");
        Ok(store)
    }

    /// Edit the agent's store. A rejected store goes back to review.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for invalid fields.
    pub async fn update(&self, owner: UserId, edit: StoreEdit<'_>) -> Result<Store> {
        let store = owned_store(self.pool, owner).await?;
        let name = edit.name.map(store_name).transpose()?;
        let contact_phone = edit.contact_phone.map(PhoneNumber::parse).transpose()?;

        Ok(self
            .stores
            .update_details(
                store.id,
                StoreChanges {
                    name,
                    description: edit.description.map(str::trim),
                    contact_phone: contact_phone.as_ref(),
                },
            )
            .await?)
    }

    /// Replace the agent's store logo with a validated data URL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the image is rejected.
    pub async fn set_logo(&self, owner: UserId, data_url: &str) -> Result<Store> {
        let data_url = data_url.trim();
        let mime = logo::validate_data_url(data_url)?;
        let store = owned_store(self.pool, owner).await?;

        info!(store_id = %store.id, mime, bytes = data_url.len(), "Store logo updated");
        Ok(self.stores.set_logo(store.id, data_url).await?)
    }

    /// Stores for the admin queue, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, status: Option<StoreStatus>) -> Result<Vec<Store>> {
        Ok(self.stores.list(status).await?)
    }

    /// Admin decision on a store's status.
    ///
    /// Rejection requires a reason, which is shown to the agent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown store and
    /// `AppError::Conflict` for an illegal move.
    #[instrument(skip(self, reason))]
    pub async fn set_status(
        &self,
        id: StoreId,
        next: StoreStatus,
        reason: Option<&str>,
    ) -> Result<Store> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if next == StoreStatus::Rejected && reason.is_none() {
            return Err(AppError::BadRequest("reason is required".to_string()));
        }

        let store = self
            .stores
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("store".to_string()))?;
        if !store.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "store cannot move from {} to {next}",
                store.status
            )));
        }

        let updated = self
            .stores
            .set_status(id, store.status, next, reason)
            .await?
            .ok_or_else(|| AppError::Conflict("store status changed, try again".to_string()))?;

        info!(store_id = %id, from = %store.status, to = %next, "Store status changed");
        Ok(updated)
    }
}

fn store_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "name may be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}
