//! Timebox repository over the REST backend

use async_trait::async_trait;
use serde_json::json;

use crate::domain::timebox::{
    AssignRoleRequest, CatalogEntry, Postulacion, Timebox, TimeboxRepository,
};
use crate::error::Result;
use crate::infrastructure::http::ApiClient;

#[derive(Debug, Clone)]
pub struct HttpTimeboxRepository {
    client: ApiClient,
}

impl HttpTimeboxRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

/// The backend's `estado` is not trusted; it is re-derived from the record
fn consistent(mut timebox: Timebox) -> Timebox {
    timebox.recompute_status();
    timebox
}

fn consistent_all(timeboxes: Vec<Timebox>) -> Vec<Timebox> {
    timeboxes.into_iter().map(consistent).collect()
}

#[async_trait]
impl TimeboxRepository for HttpTimeboxRepository {
    async fn list(&self) -> Result<Vec<Timebox>> {
        Ok(consistent_all(self.client.get("/timeboxes").await?))
    }

    async fn list_published(&self) -> Result<Vec<Timebox>> {
        Ok(consistent_all(self.client.get("/timeboxes/published").await?))
    }

    async fn list_with_postulations(&self) -> Result<Vec<Timebox>> {
        Ok(consistent_all(
            self.client.get("/timeboxes/with-postulations").await?,
        ))
    }

    async fn get(&self, id: &str) -> Result<Option<Timebox>> {
        let found: Option<Timebox> = self
            .client
            .get_optional(&format!("/timeboxes/{}", id))
            .await?;
        Ok(found.map(consistent))
    }

    async fn create(&self, timebox: &Timebox) -> Result<Timebox> {
        Ok(consistent(self.client.post("/timeboxes", timebox).await?))
    }

    async fn update(&self, timebox: &Timebox) -> Result<Timebox> {
        let id = timebox.require_id()?;
        Ok(consistent(
            self.client
                .put(&format!("/timeboxes/{}", id), timebox)
                .await?,
        ))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("/timeboxes/{}", id)).await
    }

    async fn postulate(&self, timebox_id: &str, postulacion: &Postulacion) -> Result<Timebox> {
        Ok(consistent(
            self.client
                .post(&format!("/timeboxes/{}/postulate", timebox_id), postulacion)
                .await?,
        ))
    }

    async fn assign_role(&self, timebox_id: &str, request: &AssignRoleRequest) -> Result<Timebox> {
        Ok(consistent(
            self.client
                .post(&format!("/timeboxes/{}/assign-role", timebox_id), request)
                .await?,
        ))
    }

    async fn reject_postulation(&self, timebox_id: &str, postulacion_id: &str) -> Result<Timebox> {
        Ok(consistent(
            self.client
                .post(
                    &format!("/timeboxes/{}/reject-postulation", timebox_id),
                    &json!({ "postulacionId": postulacion_id }),
                )
                .await?,
        ))
    }

    async fn types(&self) -> Result<Vec<CatalogEntry>> {
        self.client.get("/timeboxes/types").await
    }

    async fn categories(&self) -> Result<Vec<CatalogEntry>> {
        self.client.get("/timeboxes/categories").await
    }
}
