//! In-process identity provider. Zero-config backend and test double.

use crate::adapters::password::{self, HashCost};
use crate::domain::{AccountId, AuthFailure, DomainError, Identity};
use crate::ports::IdentityProvider;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

struct Credential {
    uid: AccountId,
    email: String,
    password_hash: String,
}

/// Identities keyed by lowercased email. The current session lives only as long as the process.
pub struct MemoryIdentityProvider {
    credentials: RwLock<HashMap<String, Credential>>,
    current: RwLock<Option<Identity>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
        }
    }

    /// Provider that already holds a signed-in session, as after a page reload.
    pub fn with_session(identity: Identity) -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
            current: RwLock::new(Some(identity)),
        }
    }

    pub async fn identity_count(&self) -> usize {
        self.credentials.read().await.len()
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        password::check_policy(password)?;
        let key = email.to_lowercase();
        let hash = password::hash_password(password, HashCost::Light)?;
        let identity = {
            let mut creds = self.credentials.write().await;
            if creds.contains_key(&key) {
                return Err(AuthFailure::EmailTaken.into());
            }
            let uid = AccountId::new(uuid::Uuid::new_v4().simple().to_string());
            creds.insert(
                key,
                Credential {
                    uid: uid.clone(),
                    email: email.to_string(),
                    password_hash: hash,
                },
            );
            Identity {
                uid,
                email: email.to_string(),
                id_token: None,
                refresh_token: None,
            }
        };
        info!(uid = %identity.uid, "identity created");
        *self.current.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        let identity = {
            let creds = self.credentials.read().await;
            let cred = creds
                .get(&email.to_lowercase())
                .ok_or(AuthFailure::InvalidCredentials)?;
            if !password::verify_password(password, &cred.password_hash)? {
                return Err(AuthFailure::InvalidCredentials.into());
            }
            Identity::new(cred.uid.as_str(), cred.email.as_str())
        };
        *self.current.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn end_session(&self, _identity: &Identity) -> Result<(), DomainError> {
        *self.current.write().await = None;
        Ok(())
    }

    async fn current_identity(&self) -> Result<Option<Identity>, DomainError> {
        Ok(self.current.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_authenticate() {
        let idp = MemoryIdentityProvider::new();
        let created = idp.create_identity("a@b.com", "Secret123").await.unwrap();
        assert_eq!(idp.current_identity().await.unwrap(), Some(created.clone()));

        idp.end_session(&created).await.unwrap();
        assert_eq!(idp.current_identity().await.unwrap(), None);

        let again = idp.authenticate("A@B.com", "Secret123").await.unwrap();
        assert_eq!(again.uid, created.uid);
    }

    #[tokio::test]
    async fn duplicate_email_and_bad_credentials() {
        let idp = MemoryIdentityProvider::new();
        idp.create_identity("a@b.com", "Secret123").await.unwrap();
        assert_eq!(
            idp.create_identity("a@b.com", "Other123").await.unwrap_err(),
            DomainError::Auth(AuthFailure::EmailTaken)
        );
        assert_eq!(
            idp.authenticate("a@b.com", "wrong-pass").await.unwrap_err(),
            DomainError::Auth(AuthFailure::InvalidCredentials)
        );
        assert_eq!(
            idp.authenticate("nobody@b.com", "Secret123").await.unwrap_err(),
            DomainError::Auth(AuthFailure::InvalidCredentials)
        );
        assert_eq!(idp.identity_count().await, 1);
    }

    #[tokio::test]
    async fn weak_password_creates_nothing() {
        let idp = MemoryIdentityProvider::new();
        assert!(matches!(
            idp.create_identity("a@b.com", "abc").await,
            Err(DomainError::Auth(AuthFailure::WeakPassword { .. }))
        ));
        assert_eq!(idp.identity_count().await, 0);
        assert_eq!(idp.current_identity().await.unwrap(), None);
    }
}
