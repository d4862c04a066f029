//! Timebox service
//!
//! Reads go through the shared timebox store; writes go to the backend first
//! and the store takes the confirmed result.

use std::sync::Arc;

use tracing::info;

use crate::domain::timebox::{CatalogEntry, Timebox, TimeboxRepository};
use crate::error::{Error, Result};
use crate::store::EntityStore;

pub struct TimeboxService {
    repo: Arc<dyn TimeboxRepository>,
    store: Arc<EntityStore<Timebox>>,
}

impl TimeboxService {
    pub fn new(repo: Arc<dyn TimeboxRepository>, store: Arc<EntityStore<Timebox>>) -> Self {
        Self { repo, store }
    }

    pub fn repository(&self) -> Arc<dyn TimeboxRepository> {
        Arc::clone(&self.repo)
    }

    pub fn store(&self) -> &Arc<EntityStore<Timebox>> {
        &self.store
    }

    /// All timeboxes, loading the store when stale
    pub async fn list(&self) -> Result<Arc<Vec<Timebox>>> {
        self.store.read(|| self.repo.list()).await
    }

    /// Reload from the backend
    pub async fn refresh(&self) -> Result<Arc<Vec<Timebox>>> {
        self.store.refresh(|| self.repo.list()).await
    }

    /// Timeboxes of one project
    pub async fn list_for_project(&self, project_id: &str) -> Result<Vec<Timebox>> {
        Ok(self
            .list()
            .await?
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    /// Fetch one timebox from the backend and cache it
    pub async fn get(&self, id: &str) -> Result<Timebox> {
        let timebox = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| Error::TimeboxNotFound(id.to_string()))?;
        self.store.upsert(timebox.clone());
        Ok(timebox)
    }

    /// The cached copy when present, else [`get`](Self::get)
    pub async fn find(&self, id: &str) -> Result<Timebox> {
        match self.store.get(id) {
            Some(timebox) => Ok(timebox),
            None => self.get(id).await,
        }
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete(id).await?;
        self.store.remove(id);
        info!(timebox_id = %id, "Timebox deleted");
        Ok(())
    }

    pub async fn published(&self) -> Result<Vec<Timebox>> {
        self.repo.list_published().await
    }

    pub async fn with_postulations(&self) -> Result<Vec<Timebox>> {
        self.repo.list_with_postulations().await
    }

    pub async fn types(&self) -> Result<Vec<CatalogEntry>> {
        self.repo.types().await
    }

    /// Categories, optionally restricted to one timebox type
    pub async fn categories(&self, type_id: Option<&str>) -> Result<Vec<CatalogEntry>> {
        let categories = self.repo.categories().await?;
        Ok(match type_id {
            Some(type_id) => categories
                .into_iter()
                .filter(|c| c.categoria_id.as_deref().is_none_or(|id| id == type_id))
                .collect(),
            None => categories,
        })
    }
}
