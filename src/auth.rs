use crate::error::AuthError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const DEMO_USERS: [(&str, &str); 2] = [("user1", "password1"), ("user2", "password2")];

/// Fixed map of username to Argon2 PHC hash string.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// The two demonstration accounts, hashed with fresh salts.
    pub fn demo() -> Result<Self, AuthError> {
        let mut store = CredentialStore::default();
        for (user, password) in DEMO_USERS {
            store.add_user(user, password)?;
        }
        Ok(store)
    }

    /// Reads a JSON object of `"username": "<phc hash>"` pairs.
    pub fn from_json_file(path: &Path) -> Result<Self, AuthError> {
        let data = fs::read_to_string(path)
            .map_err(|e| AuthError::CredentialFile(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, AuthError> {
        let users: HashMap<String, String> =
            serde_json::from_str(data).map_err(|e| AuthError::CredentialFile(e.to_string()))?;
        Ok(CredentialStore { users })
    }

    pub fn add_user(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        let hash = hash_password(password)?;
        self.users.insert(username.to_string(), hash);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Unknown users and unreadable stored hashes both fail verification.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.users.get(username) else {
            return false;
        };
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!(user = username, error = %e, "stored password hash is malformed");
                false
            }
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Who is logged in for this window. Login and logout hand back a new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn login(
        &self,
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        if store.verify(username, password) {
            info!(user = username, "login succeeded");
            Ok(Session {
                user: Some(username.to_string()),
            })
        } else {
            warn!(user = username, "login failed");
            Err(AuthError::InvalidCredentials)
        }
    }

    pub fn logout(&self) -> Session {
        if let Some(user) = &self.user {
            info!(user = %user, "logged out");
        }
        Session::anonymous()
    }
}
