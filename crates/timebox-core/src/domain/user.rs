//! Users and the people referenced by timeboxes

use serde::{Deserialize, Serialize};

/// The authenticated user (persisted as `currentUser`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rol: Option<String>,
    /// Developer record linked to this account, when the user is a developer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<String>,
}

impl User {
    /// Create a user with the minimum identifying fields
    pub fn new(id: impl Into<String>, nombre: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nombre: nombre.into(),
            email: email.into(),
            rol: None,
            developer_id: None,
        }
    }

    /// Id used for payment lookups: the developer id when known, else the user id
    pub fn developer_key(&self) -> &str {
        self.developer_id.as_deref().unwrap_or(&self.id)
    }

    /// Whether the user has an administrative role
    pub fn is_admin(&self) -> bool {
        self.rol
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("admin") || r.eq_ignore_ascii_case("administrador"))
    }
}

/// A person as embedded in timebox records (team slots, applicants, leaders)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Persona {
    /// Create a persona with only a display name
    pub fn new(nombre: impl Into<String>) -> Self {
        Self {
            id: None,
            nombre: nombre.into(),
            email: None,
        }
    }

    /// Set the backend id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// A slot is empty when no name has been entered
    pub fn is_empty(&self) -> bool {
        self.nombre.trim().is_empty()
    }

    /// Whether this persona refers to the given user (by id or email)
    pub fn is_user(&self, user: &User) -> bool {
        if let Some(id) = &self.id
            && (id == &user.id || user.developer_id.as_deref() == Some(id.as_str()))
        {
            return true;
        }
        match &self.email {
            Some(email) if !user.email.is_empty() => email.eq_ignore_ascii_case(&user.email),
            _ => false,
        }
    }

    /// Stable key for payment orders: id, then email, then name
    pub fn payee_key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.nombre)
    }
}

impl From<&User> for Persona {
    fn from(user: &User) -> Self {
        Self {
            id: Some(user.developer_key().to_string()),
            nombre: user.nombre.clone(),
            email: (!user.email.is_empty()).then(|| user.email.clone()),
        }
    }
}
