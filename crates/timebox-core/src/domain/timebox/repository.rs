//! Repository trait for timebox persistence
//!
//! Implemented over the REST backend by
//! `infrastructure::api::HttpTimeboxRepository` and in memory by
//! `infrastructure::memory::InMemoryTimeboxRepository`.

use async_trait::async_trait;

use super::entity::{AssignRoleRequest, CatalogEntry, Timebox};
use super::postulation::Postulacion;
use crate::error::Result;

#[async_trait]
pub trait TimeboxRepository: Send + Sync {
    // ========== Timebox CRUD ==========

    /// List every timebox visible to the user
    async fn list(&self) -> Result<Vec<Timebox>>;

    /// List timeboxes whose offer is published
    async fn list_published(&self) -> Result<Vec<Timebox>>;

    /// List timeboxes that have at least one application
    async fn list_with_postulations(&self) -> Result<Vec<Timebox>>;

    /// Get a timebox by id
    async fn get(&self, id: &str) -> Result<Option<Timebox>>;

    /// Create a timebox; returns it with its backend id
    async fn create(&self, timebox: &Timebox) -> Result<Timebox>;

    /// Replace a stored timebox; returns the stored version
    async fn update(&self, timebox: &Timebox) -> Result<Timebox>;

    /// Delete a timebox
    async fn delete(&self, id: &str) -> Result<()>;

    // ========== Applications ==========

    /// Append an application
    async fn postulate(&self, timebox_id: &str, postulacion: &Postulacion) -> Result<Timebox>;

    /// Approve an application and fill its role
    async fn assign_role(&self, timebox_id: &str, request: &AssignRoleRequest) -> Result<Timebox>;

    /// Reject an application
    async fn reject_postulation(&self, timebox_id: &str, postulacion_id: &str) -> Result<Timebox>;

    // ========== Catalogs ==========

    async fn types(&self) -> Result<Vec<CatalogEntry>>;

    async fn categories(&self) -> Result<Vec<CatalogEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify trait is object-safe
    fn _assert_object_safe(_: &dyn TimeboxRepository) {}
}
