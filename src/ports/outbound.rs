//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, Identity, SessionContext};
use serde_json::{Map, Value};
use std::fmt;

/// Document body: field name -> JSON value. The document id is kept outside the body.
pub type Fields = Map<String, Value>;

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

/// Logical collections of the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Accounts,
    Challenges,
    Progress,
    HealthWarnings,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Accounts,
        Collection::Challenges,
        Collection::Progress,
        Collection::HealthWarnings,
    ];

    /// Collection name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Accounts => "users",
            Collection::Challenges => "challenges",
            Collection::Progress => "progress",
            Collection::HealthWarnings => "health_warnings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set-union of one value into an array field. Missing or null fields start empty.
pub fn add_unique(fields: &mut Fields, field: &str, value: Value) -> Result<(), DomainError> {
    let slot = fields
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    let items = slot
        .as_array_mut()
        .ok_or_else(|| DomainError::Store(format!("field '{field}' is not an array")))?;
    if !items.contains(&value) {
        items.push(value);
    }
    Ok(())
}

/// Identity provider. Issues and validates credentials, holds the current identity.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new identity and sign it in.
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, DomainError>;

    /// Resolve credentials to an identity and sign it in.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, DomainError>;

    /// Invalidate the session held for `identity`.
    async fn end_session(&self, identity: &Identity) -> Result<(), DomainError>;

    /// Session established earlier (e.g. by a previous run), if any.
    async fn current_identity(&self) -> Result<Option<Identity>, DomainError>;
}

/// Remote document database. Every call carries the acting session explicitly.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a generated id and return the id.
    async fn insert_one(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, DomainError>;

    /// Create or fully replace the document with the given id.
    async fn upsert(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DomainError>;

    /// Every document in the collection, store-native order.
    async fn list_all(
        &self,
        ctx: &SessionContext,
        collection: Collection,
    ) -> Result<Vec<StoredDocument>, DomainError>;

    async fn fetch_by_id(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, DomainError>;

    /// Append `value` to the array `field` unless already present.
    ///
    /// Must be atomic against concurrent calls on the same document, so two writers
    /// adding different values both land. Fails with `NotFound` for a missing document.
    async fn add_to_set(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), DomainError>;
}
