//! People directory: personas, users and the admin role list

use crate::domain::finance::Role;
use crate::domain::user::{Persona, User};
use crate::error::Result;
use crate::infrastructure::http::ApiClient;

#[derive(Debug, Clone)]
pub struct PeopleDirectory {
    client: ApiClient,
}

impl PeopleDirectory {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// People that can fill team slots (`/personas`)
    pub async fn personas(&self) -> Result<Vec<Persona>> {
        self.client.get("/personas").await
    }

    /// Registered accounts (`/admin/users`, admin only)
    pub async fn users(&self) -> Result<Vec<User>> {
        self.client.get("/admin/users").await
    }

    /// Account roles (`/admin/roles`, admin only)
    pub async fn account_roles(&self) -> Result<Vec<Role>> {
        self.client.get("/admin/roles").await
    }

    /// Personas whose name or email contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> Result<Vec<Persona>> {
        let needle = query.trim().to_lowercase();
        let personas = self.personas().await?;
        if needle.is_empty() {
            return Ok(personas);
        }
        Ok(personas
            .into_iter()
            .filter(|p| {
                p.nombre.to_lowercase().contains(&needle)
                    || p.email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
            })
            .collect())
    }
}
