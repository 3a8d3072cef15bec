//! Data access layer. Maps application actions onto document store operations.
//!
//! Entities are serialized with serde; the store document id becomes the entity `id`
//! (accounts are keyed by `uid` instead, so the profile write is an idempotent upsert).

use crate::domain::{
    Account, AccountId, Challenge, ChallengeId, DomainError, HealthWarning, NewChallenge,
    ProgressEntry, SessionContext,
};
use crate::ports::{Collection, DocumentStore, Fields, StoredDocument};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

const PARTICIPANTS_FIELD: &str = "participants";

fn encode<T: Serialize>(entity: &T) -> Result<Fields, DomainError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(mut map)) => {
            map.remove("id");
            Ok(map)
        }
        Ok(_) => Err(DomainError::Store("entity did not serialize to an object".into())),
        Err(e) => Err(DomainError::Store(format!("encode: {}", e))),
    }
}

fn decode<T: DeserializeOwned>(doc: StoredDocument) -> Result<T, DomainError> {
    let StoredDocument { id, mut fields } = doc;
    fields.insert("id".into(), Value::String(id.clone()));
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| DomainError::Store(format!("decode document {}: {}", id, e)))
}

/// Decode every document, skipping (and logging) malformed ones so one bad record
/// does not hide the rest of a collection.
fn decode_all<T: DeserializeOwned>(collection: Collection, docs: Vec<StoredDocument>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match decode(doc) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%collection, error = %e, "skipping malformed document");
                None
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct DataAccess {
    store: Arc<dyn DocumentStore>,
}

impl DataAccess {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Profile record keyed by the identity's uid. Safe to repeat.
    pub async fn upsert_account(&self, ctx: &SessionContext, account: &Account) -> Result<(), DomainError> {
        let fields = encode(account)?;
        self.store
            .upsert(ctx, Collection::Accounts, account.uid.as_str(), fields)
            .await
    }

    pub async fn fetch_account(&self, ctx: &SessionContext, uid: &AccountId) -> Result<Option<Account>, DomainError> {
        match self.store.fetch_by_id(ctx, Collection::Accounts, uid.as_str()).await? {
            Some(doc) => decode(doc).map(Some),
            None => Ok(None),
        }
    }

    pub async fn list_challenges(&self, ctx: &SessionContext) -> Result<Vec<Challenge>, DomainError> {
        let docs = self.store.list_all(ctx, Collection::Challenges).await?;
        Ok(decode_all(Collection::Challenges, docs))
    }

    pub async fn fetch_challenge(
        &self,
        ctx: &SessionContext,
        id: &ChallengeId,
    ) -> Result<Option<Challenge>, DomainError> {
        match self.store.fetch_by_id(ctx, Collection::Challenges, id.as_str()).await? {
            Some(doc) => decode(doc).map(Some),
            None => Ok(None),
        }
    }

    /// Single atomic insert with an empty participant set.
    pub async fn insert_challenge(
        &self,
        ctx: &SessionContext,
        creator: &AccountId,
        input: NewChallenge,
    ) -> Result<ChallengeId, DomainError> {
        let challenge = Challenge {
            id: ChallengeId::new(""),
            name: input.name,
            description: input.description,
            goal_type: input.goal_type,
            target_value: input.target_value,
            duration_days: input.duration_days,
            age_groups: input.age_groups,
            difficulty_level: input.difficulty_level,
            created_by: creator.clone(),
            created_at: Utc::now(),
            participants: Vec::new(),
        };
        let id = self
            .store
            .insert_one(ctx, Collection::Challenges, encode(&challenge)?)
            .await?;
        Ok(ChallengeId::new(id))
    }

    /// Set-union write; concurrent joins by different accounts all land.
    pub async fn add_participant(
        &self,
        ctx: &SessionContext,
        id: &ChallengeId,
        uid: &AccountId,
    ) -> Result<(), DomainError> {
        self.store
            .add_to_set(
                ctx,
                Collection::Challenges,
                id.as_str(),
                PARTICIPANTS_FIELD,
                Value::String(uid.as_str().to_string()),
            )
            .await
    }

    pub async fn insert_progress(
        &self,
        ctx: &SessionContext,
        user_id: &AccountId,
        challenge_id: &ChallengeId,
        value: f64,
        notes: Option<String>,
    ) -> Result<ProgressEntry, DomainError> {
        let mut entry = ProgressEntry {
            id: String::new(),
            user_id: user_id.clone(),
            challenge_id: challenge_id.clone(),
            value,
            notes,
            logged_at: Utc::now(),
        };
        entry.id = self
            .store
            .insert_one(ctx, Collection::Progress, encode(&entry)?)
            .await?;
        Ok(entry)
    }

    /// Every progress entry in the store; callers filter by account or challenge.
    pub async fn list_progress(&self, ctx: &SessionContext) -> Result<Vec<ProgressEntry>, DomainError> {
        let docs = self.store.list_all(ctx, Collection::Progress).await?;
        Ok(decode_all(Collection::Progress, docs))
    }

    pub async fn list_health_warnings(&self, ctx: &SessionContext) -> Result<Vec<HealthWarning>, DomainError> {
        let docs = self.store.list_all(ctx, Collection::HealthWarnings).await?;
        Ok(decode_all(Collection::HealthWarnings, docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryDocumentStore;
    use crate::domain::{AgeGroup, Difficulty, FitnessLevel, GoalType, Identity, Severity};
    use serde_json::json;

    fn setup() -> (Arc<MemoryDocumentStore>, DataAccess, SessionContext) {
        let store = Arc::new(MemoryDocumentStore::new());
        let dal = DataAccess::new(store.clone());
        let ctx = SessionContext::signed_in(Identity::new("u1", "a@b.com"));
        (store, dal, ctx)
    }

    fn new_challenge() -> NewChallenge {
        NewChallenge {
            name: "Walk".into(),
            description: "10k a day".into(),
            goal_type: GoalType::Steps,
            target_value: 70_000.0,
            duration_days: 7,
            age_groups: vec![AgeGroup::Adults, AgeGroup::Youth],
            difficulty_level: Difficulty::Medium,
        }
    }

    #[tokio::test]
    async fn account_is_keyed_by_uid() {
        let (store, dal, ctx) = setup();
        let account = Account {
            uid: AccountId::new("u1"),
            full_name: "Jane".into(),
            age_group: AgeGroup::Adults,
            fitness_level: FitnessLevel::Beginner,
            email: "a@b.com".into(),
            created_at: Utc::now(),
        };
        dal.upsert_account(&ctx, &account).await.unwrap();
        dal.upsert_account(&ctx, &account).await.unwrap();
        assert_eq!(store.count(Collection::Accounts).await, 1);
        let doc = store
            .fetch_by_id(&ctx, Collection::Accounts, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields["full_name"], json!("Jane"));
        assert_eq!(doc.fields["age_group"], json!("adults"));
        assert_eq!(
            dal.fetch_account(&ctx, &AccountId::new("u1")).await.unwrap(),
            Some(account)
        );
    }

    #[tokio::test]
    async fn challenge_insert_has_creator_and_no_participants() {
        let (store, dal, ctx) = setup();
        let id = dal
            .insert_challenge(&ctx, &AccountId::new("u1"), new_challenge())
            .await
            .unwrap();
        let raw = store
            .fetch_by_id(&ctx, Collection::Challenges, id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert!(!raw.fields.contains_key("id"));
        assert_eq!(raw.fields["participants"], json!([]));

        let challenge = dal.fetch_challenge(&ctx, &id).await.unwrap().unwrap();
        assert_eq!(challenge.id, id);
        assert_eq!(challenge.created_by.as_str(), "u1");
        assert!(challenge.participants.is_empty());
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped_in_listings() {
        let (store, dal, ctx) = setup();
        dal.insert_challenge(&ctx, &AccountId::new("u1"), new_challenge())
            .await
            .unwrap();
        store
            .seed(
                Collection::Challenges,
                "broken",
                json!({"name": 5}).as_object().cloned().unwrap(),
            )
            .await;
        assert_eq!(dal.list_challenges(&ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn warnings_and_progress_decode() {
        let (store, dal, ctx) = setup();
        store
            .seed(
                Collection::HealthWarnings,
                "w1",
                json!({
                    "severity": "high",
                    "message": "Stay hydrated",
                    "age_specific_risks": ["Heat stroke"],
                })
                .as_object()
                .cloned()
                .unwrap(),
            )
            .await;
        let warnings = dal.list_health_warnings(&ctx).await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].id, "w1");
        assert_eq!(warnings[0].severity, Severity::High);
        assert_eq!(warnings[0].warning_image_url, None);

        let entry = dal
            .insert_progress(&ctx, &AccountId::new("u1"), &ChallengeId::new("c1"), 5000.0, None)
            .await
            .unwrap();
        assert_eq!(dal.list_progress(&ctx).await.unwrap(), vec![entry]);
    }
}
