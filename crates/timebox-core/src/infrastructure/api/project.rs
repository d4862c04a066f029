//! Project repository over the REST backend

use async_trait::async_trait;

use crate::domain::project::{Project, ProjectRepository};
use crate::error::{Error, Result};
use crate::infrastructure::http::ApiClient;

#[derive(Debug, Clone)]
pub struct HttpProjectRepository {
    client: ApiClient,
}

impl HttpProjectRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProjectRepository for HttpProjectRepository {
    async fn list(&self) -> Result<Vec<Project>> {
        self.client.get("/projects").await
    }

    async fn get(&self, id: &str) -> Result<Option<Project>> {
        self.client.get_optional(&format!("/projects/{}", id)).await
    }

    async fn create(&self, project: &Project) -> Result<Project> {
        project.validate_tree()?;
        self.client.post("/projects", project).await
    }

    async fn update(&self, project: &Project) -> Result<Project> {
        if project.id.is_empty() {
            return Err(Error::InvalidInput(
                "Project has not been saved yet".to_string(),
            ));
        }
        project.validate_tree()?;
        self.client
            .put(&format!("/projects/{}", project.id), project)
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/projects/{}", id)).await
    }
}
