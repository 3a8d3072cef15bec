//! Progress logging. Entries are append-only and never touch the challenge record.

use crate::domain::{ChallengeId, DomainError, ProgressEntry, SessionContext, validation};
use crate::usecases::DataAccess;
use tracing::info;

pub struct ProgressService {
    data: DataAccess,
}

impl ProgressService {
    pub fn new(data: DataAccess) -> Self {
        Self { data }
    }

    /// # Arguments
    /// * `challenge_id` - challenge the measurement belongs to
    /// * `value` - raw numeric input; must parse as a finite number
    /// * `notes` - free text, blank means none
    pub async fn log_progress(
        &self,
        ctx: &SessionContext,
        challenge_id: &ChallengeId,
        value: &str,
        notes: &str,
    ) -> Result<ProgressEntry, DomainError> {
        let value = validation::number("value", value)?;
        let notes = validation::optional_text(notes);
        let identity = ctx.require()?;
        let entry = self
            .data
            .insert_progress(ctx, &identity.uid, challenge_id, value, notes)
            .await?;
        info!(challenge_id = %challenge_id, uid = %identity.uid, value, "progress logged");
        Ok(entry)
    }

    /// Entries logged by the signed-in account, oldest first.
    pub async fn my_progress(&self, ctx: &SessionContext) -> Result<Vec<ProgressEntry>, DomainError> {
        let identity = ctx.require()?;
        let mut entries: Vec<ProgressEntry> = self
            .data
            .list_progress(ctx)
            .await?
            .into_iter()
            .filter(|e| e.user_id == identity.uid)
            .collect();
        entries.sort_by_key(|e| e.logged_at);
        Ok(entries)
    }

    /// Every account's entries; used for leaderboards.
    pub async fn all_progress(&self, ctx: &SessionContext) -> Result<Vec<ProgressEntry>, DomainError> {
        self.data.list_progress(ctx).await
    }
}
