//! Persists the signed-in identity to a JSON file so a later run resumes the session.

use crate::domain::{DomainError, Identity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
struct SessionData {
    identity: Identity,
    saved_at: chrono::DateTime<chrono::Utc>,
}

/// JSON file holding the current session, if any.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file means no session. An unreadable one is discarded with a warning.
    pub async fn load(&self) -> Result<Option<Identity>, DomainError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DomainError::Session(format!("read session file: {}", e))),
        };
        match serde_json::from_str::<SessionData>(&raw) {
            Ok(data) => Ok(Some(data.identity)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                Ok(None)
            }
        }
    }

    /// Write-replace: temp file, fsync, rename over the target.
    pub async fn save(&self, identity: &Identity) -> Result<(), DomainError> {
        let data = SessionData {
            identity: identity.clone(),
            saved_at: chrono::Utc::now(),
        };
        let json =
            serde_json::to_string_pretty(&data).map_err(|e| DomainError::Session(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Session(format!("create session dir: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Session(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Session(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Session(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Session(format!("atomic rename failed: {}", e)))?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), DomainError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Session(format!("remove session file: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_load_clear() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));
        assert_eq!(file.load().await.unwrap(), None);

        let mut identity = Identity::new("u1", "a@b.com");
        identity.id_token = Some("token".into());
        file.save(&identity).await.unwrap();
        assert_eq!(file.load().await.unwrap(), Some(identity));

        file.clear().await.unwrap();
        assert_eq!(file.load().await.unwrap(), None);
        file.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_signed_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        assert_eq!(SessionFile::new(&path).load().await.unwrap(), None);
    }
}
