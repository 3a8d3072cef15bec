//! Implements DocumentStore against the Cloud Firestore REST API.
//!
//! add_to_set is a `:commit` with an `appendMissingElements` field transform, which
//! Firestore applies atomically server-side; concurrent joins never overwrite each other.

use crate::adapters::firebase::codec;
use crate::domain::{DomainError, SessionContext};
use crate::ports::{Collection, DocumentStore, Fields, StoredDocument};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use tracing::debug;

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

pub struct FirestoreAdapter {
    client: Client,
    project_id: String,
}

impl FirestoreAdapter {
    pub fn new(client: Client, project_id: String) -> Self {
        Self { client, project_id }
    }

    /// `projects/{p}/databases/(default)/documents`
    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}/{}", FIRESTORE_URL, self.database_path(), collection.name())
    }

    fn document_name(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{}", self.database_path(), collection.name(), id)
    }

    fn authorized(ctx: &SessionContext, req: RequestBuilder) -> RequestBuilder {
        match ctx.bearer_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(ctx: &SessionContext, req: RequestBuilder) -> Result<Option<Value>, DomainError> {
        let res = Self::authorized(ctx, req)
            .send()
            .await
            .map_err(|e| DomainError::Store(format!("request failed: {}", e)))?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(DomainError::Unauthenticated);
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            debug!(%status, body = %text, "firestore error");
            return Err(DomainError::Store(format!("Firestore error {}: {}", status, text)));
        }
        let body = res
            .json::<Value>()
            .await
            .map_err(|e| DomainError::Store(format!("bad response: {}", e)))?;
        Ok(Some(body))
    }

    async fn send_expecting(ctx: &SessionContext, req: RequestBuilder, what: &str) -> Result<Value, DomainError> {
        Self::send(ctx, req)
            .await?
            .ok_or_else(|| DomainError::NotFound(what.to_string()))
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreAdapter {
    async fn insert_one(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, DomainError> {
        let req = self
            .client
            .post(self.collection_url(collection))
            .json(&json!({ "fields": codec::encode_fields(&fields) }));
        let doc = Self::send_expecting(ctx, req, collection.name()).await?;
        Ok(codec::decode_document(&doc)?.id)
    }

    async fn upsert(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DomainError> {
        // PATCH without an update mask replaces the whole document, creating it if absent.
        let url = format!("{}/{}", self.collection_url(collection), id);
        let req = self
            .client
            .patch(url)
            .json(&json!({ "fields": codec::encode_fields(&fields) }));
        Self::send_expecting(ctx, req, &format!("{collection}/{id}")).await?;
        Ok(())
    }

    async fn list_all(
        &self,
        ctx: &SessionContext,
        collection: Collection,
    ) -> Result<Vec<StoredDocument>, DomainError> {
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .client
                .get(self.collection_url(collection))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }
            let Some(body) = Self::send(ctx, req).await? else {
                break;
            };
            if let Some(items) = body.get("documents").and_then(Value::as_array) {
                for item in items {
                    docs.push(codec::decode_document(item)?);
                }
            }
            page_token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(String::from);
            if page_token.is_none() {
                break;
            }
        }
        Ok(docs)
    }

    async fn fetch_by_id(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, DomainError> {
        let url = format!("{}/{}", self.collection_url(collection), id);
        match Self::send(ctx, self.client.get(url)).await? {
            Some(doc) => Ok(Some(codec::decode_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn add_to_set(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), DomainError> {
        let url = format!("{}/{}:commit", FIRESTORE_URL, self.database_path());
        let body = json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(collection, id),
                    "fieldTransforms": [{
                        "fieldPath": field,
                        "appendMissingElements": { "values": [codec::encode_value(&value)] },
                    }],
                },
                "currentDocument": { "exists": true },
            }],
        });
        let req = self.client.post(url).json(&body);
        match Self::send(ctx, req).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(DomainError::NotFound(format!("{collection}/{id}"))),
            // failed precondition (document missing) surfaces as 400
            Err(DomainError::Store(msg)) if msg.contains("FAILED_PRECONDITION") => {
                Err(DomainError::NotFound(format!("{collection}/{id}")))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_paths() {
        let adapter = FirestoreAdapter::new(Client::new(), "fit-together".into());
        assert_eq!(
            adapter.collection_url(Collection::Challenges),
            "https://firestore.googleapis.com/v1/projects/fit-together/databases/(default)/documents/challenges"
        );
        assert_eq!(
            adapter.document_name(Collection::Accounts, "u1"),
            "projects/fit-together/databases/(default)/documents/users/u1"
        );
    }
}
