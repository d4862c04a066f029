//! Project service: projects and their content tree

use std::sync::Arc;

use tracing::info;

use crate::domain::attachment::{UploadFile, Uploader};
use crate::domain::project::{ContentType, Project, ProjectContent, ProjectRepository};
use crate::error::{Error, Result};
use crate::store::EntityStore;

pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
    store: EntityStore<Project>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self {
        Self {
            repo,
            store: EntityStore::new("projects"),
        }
    }

    pub fn store(&self) -> &EntityStore<Project> {
        &self.store
    }

    pub async fn list(&self) -> Result<Arc<Vec<Project>>> {
        self.store.read(|| self.repo.list()).await
    }

    pub async fn refresh(&self) -> Result<Arc<Vec<Project>>> {
        self.store.refresh(|| self.repo.list()).await
    }

    /// The cached project, else fetched from the backend
    pub async fn get(&self, id: &str) -> Result<Project> {
        if let Some(project) = self.store.get(id) {
            return Ok(project);
        }
        let project = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
        self.store.upsert(project.clone());
        Ok(project)
    }

    pub async fn create(&self, project: &Project) -> Result<Project> {
        if project.nombre.trim().is_empty() {
            return Err(Error::InvalidInput("Project name is required".to_string()));
        }
        project.validate_tree()?;
        let created = self.repo.create(project).await?;
        self.store.upsert(created.clone());
        info!(project_id = %created.id, "Project created");
        Ok(created)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete(id).await?;
        self.store.remove(id);
        Ok(())
    }

    /// Add a node under a folder (`None` for the root) and save the tree
    pub async fn add_content(
        &self,
        project_id: &str,
        parent_id: Option<&str>,
        node: ProjectContent,
    ) -> Result<Project> {
        let mut candidate = self.get(project_id).await?;
        candidate.add_content(parent_id, node)?;
        self.save(candidate).await
    }

    /// Upload a file and add it as a leaf node
    pub async fn add_file(
        &self,
        uploader: &dyn Uploader,
        project_id: &str,
        parent_id: Option<&str>,
        tipo: ContentType,
        file: UploadFile,
    ) -> Result<Project> {
        let nombre = file.file_name.clone();
        if tipo.is_folder() {
            return Err(Error::InvalidInput(
                "A folder cannot carry an attachment".to_string(),
            ));
        }
        // resolve the parent before uploading anything
        self.get(project_id).await?.children_of(parent_id)?;
        let adjunto = uploader.upload(file).await?;
        self.add_content(project_id, parent_id, ProjectContent::leaf(nombre, tipo, adjunto)?)
            .await
    }

    /// Remove a node and its subtree
    pub async fn remove_content(&self, project_id: &str, content_id: &str) -> Result<Project> {
        let mut candidate = self.get(project_id).await?;
        candidate
            .remove_content(content_id)
            .ok_or_else(|| Error::ContentNotFound(content_id.to_string()))?;
        self.save(candidate).await
    }

    async fn save(&self, candidate: Project) -> Result<Project> {
        let saved = self.repo.update(&candidate).await?;
        self.store.upsert(saved.clone());
        Ok(saved)
    }
}
