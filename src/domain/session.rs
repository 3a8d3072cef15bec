//! Identity and the explicit session context handed to every store operation.

use crate::domain::{AccountId, DomainError};
use serde::{Deserialize, Serialize};

/// Authenticated session reference issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: AccountId,
    pub email: String,
    /// Bearer credential for providers that need one (Firebase id token).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: AccountId::new(uid),
            email: email.into(),
            id_token: None,
            refresh_token: None,
        }
    }
}

/// Who is acting. Passed by reference into the data access layer and stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    identity: Option<Identity>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Fails with `Unauthenticated` when nobody is signed in.
    pub fn require(&self) -> Result<&Identity, DomainError> {
        self.identity.as_ref().ok_or(DomainError::Unauthenticated)
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.id_token.as_deref())
    }
}
