//! Repository trait for project persistence

use async_trait::async_trait;

use super::entity::Project;
use crate::error::Result;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// List all projects
    async fn list(&self) -> Result<Vec<Project>>;

    /// Get a project by id
    async fn get(&self, id: &str) -> Result<Option<Project>>;

    /// Create a project; returns it with its backend id
    async fn create(&self, project: &Project) -> Result<Project>;

    /// Replace a stored project (including its content tree)
    async fn update(&self, project: &Project) -> Result<Project>;

    /// Delete a project
    async fn delete(&self, id: &str) -> Result<()>;
}
