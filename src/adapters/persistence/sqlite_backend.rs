//! SQLite-backed local backend via libsql. Implements DocumentStore and IdentityProvider.
//!
//! One database file (fit_together.db) in the data directory:
//! - `documents`: (collection, id) primary key, JSON body, rowid gives store-native order
//! - `identities`: credentials for the self-hosted identity provider
//!
//! The signed-in identity is kept in `session.json` next to the database.

use crate::adapters::password::{self, HashCost};
use crate::adapters::persistence::session_file::SessionFile;
use crate::domain::{AccountId, AuthFailure, DomainError, Identity, SessionContext};
use crate::ports::outbound::add_unique;
use crate::ports::{Collection, DocumentStore, Fields, IdentityProvider, StoredDocument};
use libsql::{Connection, Database, TransactionBehavior, params};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// How long a connection waits on a lock held by another process before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

const DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)"#;

const IDENTITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS identities (
    uid TEXT PRIMARY KEY,
    email_key TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#;

fn store_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Store(e.to_string())
}

/// Run a PRAGMA and drain its result row (execute fails when rows are returned).
async fn pragma(conn: &Connection, sql: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|e| DomainError::Store(format!("{sql} failed: {e}")))?;
    while rows.next().await.map_err(store_err)?.is_some() {}
    Ok(())
}

/// Connection that waits out locks taken by other processes sharing the file.
async fn open_conn(db: &Database) -> Result<Connection, DomainError> {
    let conn = db.connect().map_err(store_err)?;
    pragma(&conn, &format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")).await?;
    Ok(conn)
}

pub struct SqliteBackend {
    db: Database,
    db_path: PathBuf,
    session: SessionFile,
    /// Serializes add_to_set within this process; other processes are excluded by the
    /// IMMEDIATE transaction.
    write_lock: Mutex<()>,
}

impl SqliteBackend {
    /// Open (or create) the database in `base_dir` and ensure the schema exists.
    /// Call once at startup; share via Arc.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(store_err)?;
        let db_path = base.join("fit_together.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(store_err)?;
        let conn = open_conn(&db).await?;

        pragma(&conn, "PRAGMA journal_mode=WAL").await?;

        conn.execute(DOCUMENTS_TABLE, ()).await.map_err(store_err)?;
        conn.execute(IDENTITIES_TABLE, ()).await.map_err(store_err)?;

        info!(path = %db_path.display(), "SQLite backend ready");

        Ok(Self {
            db,
            session: SessionFile::new(base.join("session.json")),
            db_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn conn(&self) -> Result<Connection, DomainError> {
        open_conn(&self.db).await
    }

    fn encode(fields: &Fields) -> Result<String, DomainError> {
        serde_json::to_string(fields).map_err(store_err)
    }

    fn decode(id: String, body: &str) -> Result<StoredDocument, DomainError> {
        let fields: Fields = serde_json::from_str(body).map_err(store_err)?;
        Ok(StoredDocument { id, fields })
    }

    async fn identity_exists(&self, uid: &AccountId) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT 1 FROM identities WHERE uid = ?1", params![uid.as_str()])
            .await
            .map_err(store_err)?;
        Ok(rows.next().await.map_err(store_err)?.is_some())
    }
}

#[async_trait::async_trait]
impl DocumentStore for SqliteBackend {
    async fn insert_one(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, DomainError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = Self::encode(&fields)?;
        self.conn().await?
            .execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection.name(), id.as_str(), body],
            )
            .await
            .map_err(store_err)?;
        Ok(id)
    }

    async fn upsert(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DomainError> {
        let body = Self::encode(&fields)?;
        self.conn().await?
            .execute(
                r#"
                INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
                ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body
                "#,
                params![collection.name(), id, body],
            )
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_all(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
    ) -> Result<Vec<StoredDocument>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid",
                params![collection.name()],
            )
            .await
            .map_err(store_err)?;
        let mut docs = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            let id: String = row.get(0).map_err(store_err)?;
            let body: String = row.get(1).map_err(store_err)?;
            match Self::decode(id.clone(), &body) {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(%collection, %id, error = %e, "skipping unreadable document body"),
            }
        }
        Ok(docs)
    }

    async fn fetch_by_id(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.name(), id],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => {
                let body: String = row.get(0).map_err(store_err)?;
                Ok(Some(Self::decode(id.to_string(), &body)?))
            }
            None => Ok(None),
        }
    }

    async fn add_to_set(
        &self,
        _ctx: &SessionContext,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.conn().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(store_err)?;
        let body: String = {
            let mut rows = tx
                .query(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection.name(), id],
                )
                .await
                .map_err(store_err)?;
            let row = rows
                .next()
                .await
                .map_err(store_err)?
                .ok_or_else(|| DomainError::NotFound(format!("{collection}/{id}")))?;
            row.get(0).map_err(store_err)?
        };
        let mut doc = Self::decode(id.to_string(), &body)?;
        add_unique(&mut doc.fields, field, value)?;
        tx.execute(
            "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3",
            params![Self::encode(&doc.fields)?, collection.name(), id],
        )
        .await
        .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SqliteBackend {
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        password::check_policy(password)?;
        let hash = password::hash_password(password, HashCost::Standard)?;
        let uid = uuid::Uuid::new_v4().simple().to_string();
        let now = chrono::Utc::now().timestamp();
        let conn = self.conn().await?;
        let mut existing = conn
            .query(
                "SELECT 1 FROM identities WHERE email_key = ?1",
                params![email.to_lowercase()],
            )
            .await
            .map_err(store_err)?;
        if existing.next().await.map_err(store_err)?.is_some() {
            return Err(AuthFailure::EmailTaken.into());
        }
        conn.execute(
            r#"
            INSERT INTO identities (uid, email_key, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![uid.as_str(), email.to_lowercase(), email, hash, now],
        )
        .await
        .map_err(|e| {
            // lost a race on the unique email key
            if e.to_string().contains("UNIQUE") {
                DomainError::Auth(AuthFailure::EmailTaken)
            } else {
                store_err(e)
            }
        })?;
        let identity = Identity::new(uid, email);
        self.session.save(&identity).await?;
        info!(uid = %identity.uid, "identity created");
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT uid, email, password_hash FROM identities WHERE email_key = ?1",
                params![email.to_lowercase()],
            )
            .await
            .map_err(store_err)?;
        let row = rows
            .next()
            .await
            .map_err(store_err)?
            .ok_or(AuthFailure::InvalidCredentials)?;
        let uid: String = row.get(0).map_err(store_err)?;
        let stored_email: String = row.get(1).map_err(store_err)?;
        let hash: String = row.get(2).map_err(store_err)?;
        if !password::verify_password(password, &hash)? {
            return Err(AuthFailure::InvalidCredentials.into());
        }
        let identity = Identity::new(uid, stored_email);
        self.session.save(&identity).await?;
        Ok(identity)
    }

    async fn end_session(&self, _identity: &Identity) -> Result<(), DomainError> {
        self.session.clear().await
    }

    async fn current_identity(&self) -> Result<Option<Identity>, DomainError> {
        match self.session.load().await? {
            Some(identity) if self.identity_exists(&identity.uid).await? => Ok(Some(identity)),
            Some(_) => {
                self.session.clear().await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
