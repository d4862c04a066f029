//! Authentication against `/users/auth/*`
//!
//! Successful logins are persisted through the shared [`SessionStore`], so
//! every [`ApiClient`] clone picks up the new bearer token immediately.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::user::User;
use crate::error::{Error, Result};
use crate::infrastructure::http::ApiClient;
use crate::infrastructure::session::Session;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub nombre: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rol: Option<String>,
}

/// Token payload returned by login and refresh
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default, alias = "usuario")]
    user: Option<User>,
}

/// `verify` answers either with the user or with `{ user: ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VerifyResponse {
    Wrapped {
        #[serde(alias = "usuario")]
        user: User,
    },
    Bare(User),
}

#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The logged-in user, from the persisted session
    pub fn current_user(&self) -> Option<User> {
        self.client.session().current_user()
    }

    /// The logged-in user or [`Error::NotAuthenticated`]
    pub fn require_user(&self) -> Result<User> {
        let session = self.client.session();
        match session.current_user() {
            Some(user) if session.is_authenticated() => Ok(user),
            _ => Err(Error::NotAuthenticated),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(Error::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let tokens: TokenResponse = self
            .client
            .post("/users/auth/login", &credentials)
            .await?;
        let user = tokens.user.ok_or_else(|| {
            Error::InvalidResponse("/users/auth/login: response has no user".to_string())
        })?;

        self.client.session().save(Session {
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
            developer_id: user.developer_id.clone(),
            current_user: Some(user.clone()),
        })?;
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Tell the backend, then forget the session regardless of the answer
    pub async fn logout(&self) -> Result<()> {
        let session = self.client.session();
        if session.is_authenticated()
            && let Err(e) = self
                .client
                .post::<_, serde_json::Value>("/users/auth/logout", &json!({}))
                .await
        {
            warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }
        session.clear();
        info!("Logged out");
        Ok(())
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(&self) -> Result<()> {
        let session = self.client.session();
        let refresh_token = session.refresh_token().ok_or(Error::NotAuthenticated)?;
        let tokens: TokenResponse = self
            .client
            .post(
                "/users/auth/refresh",
                &json!({ "refreshToken": refresh_token }),
            )
            .await?;
        session.update_tokens(tokens.access_token, tokens.refresh_token)?;
        Ok(())
    }

    /// Check the token with the backend and refresh the cached user
    pub async fn verify(&self) -> Result<User> {
        let session = self.client.session();
        if !session.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        let user = match self.client.get::<VerifyResponse>("/users/auth/verify").await? {
            VerifyResponse::Wrapped { user } | VerifyResponse::Bare(user) => user,
        };
        let mut snapshot = session.snapshot();
        snapshot.developer_id = user.developer_id.clone().or(snapshot.developer_id);
        snapshot.current_user = Some(user.clone());
        session.save(snapshot)?;
        Ok(user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        if request.nombre.trim().is_empty() || request.email.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Name and email are required".to_string(),
            ));
        }
        self.client.post("/users/auth/register", request).await
    }
}
