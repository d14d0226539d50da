//! Per-project password cache
//!
//! Passwords for protected projects live only in process memory for the
//! lifetime of the session and are never written to disk. The store is
//! shared between the API client (which reads it for every request) and the
//! project controller (which fills it on unlock).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};

/// Session-scoped password store keyed by project id
#[derive(Clone, Default)]
pub struct SessionStore {
    passwords: Arc<RwLock<HashMap<String, SecretString>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache the password for a project, replacing any previous one
    pub fn set_password(&self, project_id: &str, password: &str) {
        if let Ok(mut map) = self.passwords.write() {
            map.insert(
                project_id.to_string(),
                SecretString::from(password.to_string()),
            );
        }
    }

    /// Cached password for a project, if any
    pub fn password(&self, project_id: &str) -> Option<String> {
        self.passwords
            .read()
            .ok()
            .and_then(|map| map.get(project_id).map(|s| s.expose_secret().to_string()))
    }

    pub fn has_password(&self, project_id: &str) -> bool {
        self.passwords
            .read()
            .map(|map| map.contains_key(project_id))
            .unwrap_or(false)
    }

    /// Forget the password for a project (after a rejected unlock or a delete)
    pub fn forget(&self, project_id: &str) {
        if let Ok(mut map) = self.passwords.write() {
            map.remove(project_id);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut map) = self.passwords.write() {
            map.clear();
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.passwords.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("SessionStore")
            .field("cached_projects", &count)
            .finish()
    }
}
