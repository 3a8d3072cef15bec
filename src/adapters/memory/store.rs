//! In-process document store. Zero-config backend and test double.
//!
//! Collections keep insertion order. Writes take the collection lock for their whole
//! read-modify-write, so `add_to_set` never loses a concurrent update.

use crate::domain::{DomainError, SessionContext};
use crate::ports::outbound::add_unique;
use crate::ports::{Collection, DocumentStore, Fields, StoredDocument};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<StoredDocument>>>,
    /// Simulated network latency per call.
    latency: Duration,
    unavailable: AtomicBool,
    failing_writes: AtomicUsize,
    failing_reads: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            latency,
            unavailable: AtomicBool::new(false),
            failing_writes: AtomicUsize::new(0),
            failing_reads: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a store error while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The next `n` write calls fail with a store error.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// The next `n` read calls fail with a store error.
    pub fn fail_next_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    /// Seed a document directly, bypassing sessions (externally supplied data).
    pub async fn seed(&self, collection: Collection, id: &str, fields: Fields) {
        let mut cols = self.collections.write().await;
        let docs = cols.entry(collection).or_default();
        docs.retain(|d| d.id != id);
        docs.push(StoredDocument {
            id: id.to_string(),
            fields,
        });
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    async fn network(&self, write: bool) -> Result<(), DomainError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Store("document store unavailable".into()));
        }
        let (budget, reason) = if write {
            (&self.failing_writes, "write rejected")
        } else {
            (&self.failing_reads, "read failed")
        };
        if budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DomainError::Store(reason.into()));
        }
        Ok(())
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert_one(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, DomainError> {
        self.network(true).await?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn upsert(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DomainError> {
        self.network(true).await?;
        let mut cols = self.collections.write().await;
        let docs = cols.entry(collection).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => doc.fields = fields,
            None => docs.push(StoredDocument {
                id: id.to_string(),
                fields,
            }),
        }
        Ok(())
    }

    async fn list_all(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
    ) -> Result<Vec<StoredDocument>, DomainError> {
        self.network(false).await?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_by_id(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, DomainError> {
        self.network(false).await?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn add_to_set(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), DomainError> {
        self.network(true).await?;
        let mut cols = self.collections.write().await;
        let doc = cols
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| DomainError::NotFound(format!("{collection}/{id}")))?;
        add_unique(&mut doc.fields, field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_list_fetch() {
        let store = MemoryDocumentStore::new();
        let ctx = SessionContext::anonymous();
        let a = store
            .insert_one(&ctx, Collection::Challenges, fields(json!({"name": "a"})))
            .await
            .unwrap();
        let b = store
            .insert_one(&ctx, Collection::Challenges, fields(json!({"name": "b"})))
            .await
            .unwrap();
        assert_ne!(a, b);

        let listed = store.list_all(&ctx, Collection::Challenges).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec![a.clone(), b]);

        let got = store
            .fetch_by_id(&ctx, Collection::Challenges, &a)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.fields["name"], json!("a"));
        assert!(
            store
                .fetch_by_id(&ctx, Collection::Progress, &a)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let store = MemoryDocumentStore::new();
        let ctx = SessionContext::anonymous();
        store
            .upsert(&ctx, Collection::Accounts, "u1", fields(json!({"n": 1})))
            .await
            .unwrap();
        store
            .upsert(&ctx, Collection::Accounts, "u1", fields(json!({"n": 2})))
            .await
            .unwrap();
        assert_eq!(store.count(Collection::Accounts).await, 1);
        let doc = store
            .fetch_by_id(&ctx, Collection::Accounts, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields["n"], json!(2));
    }

    #[tokio::test]
    async fn add_to_set_is_duplicate_safe_and_requires_document() {
        let store = MemoryDocumentStore::new();
        let ctx = SessionContext::anonymous();
        let id = store
            .insert_one(&ctx, Collection::Challenges, fields(json!({"participants": []})))
            .await
            .unwrap();
        for _ in 0..2 {
            store
                .add_to_set(&ctx, Collection::Challenges, &id, "participants", json!("u1"))
                .await
                .unwrap();
        }
        let doc = store
            .fetch_by_id(&ctx, Collection::Challenges, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields["participants"], json!(["u1"]));

        let missing = store
            .add_to_set(&ctx, Collection::Challenges, "nope", "participants", json!("u1"))
            .await;
        assert!(matches!(missing, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_add_to_set_keeps_every_value() {
        let store = Arc::new(MemoryDocumentStore::with_latency(Duration::from_millis(5)));
        let ctx = SessionContext::anonymous();
        let id = store
            .insert_one(&ctx, Collection::Challenges, fields(json!({"participants": []})))
            .await
            .unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = id.clone();
                tokio::spawn(async move {
                    store
                        .add_to_set(
                            &SessionContext::anonymous(),
                            Collection::Challenges,
                            &id,
                            "participants",
                            json!(format!("u{i}")),
                        )
                        .await
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }
        let doc = store
            .fetch_by_id(&ctx, Collection::Challenges, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields["participants"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn failure_injection() {
        let store = MemoryDocumentStore::new();
        let ctx = SessionContext::anonymous();
        store.fail_next_writes(1);
        assert!(
            store
                .insert_one(&ctx, Collection::Progress, Fields::new())
                .await
                .is_err()
        );
        assert!(
            store
                .insert_one(&ctx, Collection::Progress, Fields::new())
                .await
                .is_ok()
        );
        store.fail_next_reads(1);
        assert!(store.list_all(&ctx, Collection::Progress).await.is_err());
        assert!(store.list_all(&ctx, Collection::Progress).await.is_ok());
        store.set_unavailable(true);
        assert!(matches!(
            store.list_all(&ctx, Collection::Progress).await,
            Err(DomainError::Store(_))
        ));
    }

    #[test]
    fn add_unique_rejects_non_arrays() {
        let mut f = fields(json!({"participants": "u1"}));
        assert!(add_unique(&mut f, "participants", json!("u2")).is_err());
        let mut f = fields(json!({"participants": null}));
        add_unique(&mut f, "participants", json!("u2")).unwrap();
        assert_eq!(f["participants"], json!(["u2"]));
    }
}
