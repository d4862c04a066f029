//! Persisted login session
//!
//! Holds the tokens, the current user and the developer id in a JSON file
//! next to the configuration. Clearing the session removes the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::user::User;
use crate::error::Result;

/// Session contents as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// File-backed session shared by the HTTP client and the services
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    state: RwLock<Session>,
}

impl SessionStore {
    /// Open the session file, starting empty when it is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
                Session::default()
            }),
            Err(_) => Session::default(),
        };
        Self {
            path: Some(path),
            state: RwLock::new(session),
        }
    }

    /// A session that lives only in memory
    pub fn in_memory(session: Session) -> Self {
        Self {
            path: None,
            state: RwLock::new(session),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> Session {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().access_token
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.snapshot().refresh_token
    }

    pub fn current_user(&self) -> Option<User> {
        self.snapshot().current_user
    }

    pub fn developer_id(&self) -> Option<String> {
        let session = self.snapshot();
        session.developer_id.or_else(|| {
            session
                .current_user
                .map(|u| u.developer_key().to_string())
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    /// Replace the session and persist it
    pub fn save(&self, session: Session) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, serde_json::to_string_pretty(&session)?)?;
            debug!(path = %path.display(), "Session saved");
        }
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = session;
        Ok(())
    }

    /// Update the tokens, keeping the user
    pub fn update_tokens(&self, access_token: String, refresh_token: Option<String>) -> Result<()> {
        let mut session = self.snapshot();
        session.access_token = Some(access_token);
        if refresh_token.is_some() {
            session.refresh_token = refresh_token;
        }
        self.save(session)
    }

    /// Forget everything and delete the file
    pub fn clear(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
        if let Some(path) = &self.path
            && path.exists()
            && let Err(e) = fs::remove_file(path)
        {
            warn!(path = %path.display(), error = %e, "Failed to remove session file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> Session {
        let mut user = User::new("u-1", "Ana", "ana@example.com");
        user.developer_id = Some("dev-7".to_string());
        Session {
            access_token: Some("tok".to_string()),
            refresh_token: Some("ref".to_string()),
            current_user: Some(user),
            developer_id: None,
        }
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(&path);
        assert!(!store.is_authenticated());
        store.save(session()).unwrap();

        let reopened = SessionStore::open(&path);
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.access_token().as_deref(), Some("tok"));
        assert_eq!(reopened.developer_id().as_deref(), Some("dev-7"));
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(session()).unwrap();
        assert!(json.get("accessToken").is_some());
        assert!(json.get("refreshToken").is_some());
        assert!(json.get("currentUser").is_some());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::open(&path);
        store.save(session()).unwrap();

        store.clear();
        assert!(!path.exists());
        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert!(!SessionStore::open(&path).is_authenticated());
    }

    #[test]
    fn test_update_tokens_keeps_user() {
        let store = SessionStore::in_memory(session());
        store.update_tokens("new".to_string(), None).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("new"));
        assert_eq!(store.refresh_token().as_deref(), Some("ref"));
        assert!(store.current_user().is_some());
    }
}
