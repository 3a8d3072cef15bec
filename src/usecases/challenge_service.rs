//! Challenge listing, creation and joining.

use crate::domain::{
    AgeGroup, Challenge, ChallengeId, Difficulty, DomainError, GoalType, NewChallenge,
    SessionContext, validation,
};
use crate::usecases::DataAccess;
use tracing::info;

/// Raw challenge input as typed by the user.
#[derive(Debug, Clone)]
pub struct ChallengeDraft {
    pub name: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_value: String,
    pub duration_days: String,
    pub age_groups: Vec<AgeGroup>,
    pub difficulty_level: Difficulty,
}

impl ChallengeDraft {
    /// Everything required except `age_groups`, which may be empty.
    pub fn validate(&self) -> Result<NewChallenge, DomainError> {
        let mut age_groups = self.age_groups.clone();
        age_groups.sort();
        age_groups.dedup();
        Ok(NewChallenge {
            name: validation::required("name", &self.name)?.to_string(),
            description: validation::required("description", &self.description)?.to_string(),
            goal_type: self.goal_type,
            target_value: validation::positive_number("target_value", &self.target_value)?,
            duration_days: validation::positive_days("duration_days", &self.duration_days)?,
            age_groups,
            difficulty_level: self.difficulty_level,
        })
    }
}

/// Result of a join request. Joining twice is a notice, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
}

pub struct ChallengeService {
    data: DataAccess,
}

impl ChallengeService {
    pub fn new(data: DataAccess) -> Self {
        Self { data }
    }

    /// Full fetch, store-native order. Idempotent read.
    pub async fn list_challenges(&self, ctx: &SessionContext) -> Result<Vec<Challenge>, DomainError> {
        self.data.list_challenges(ctx).await
    }

    pub async fn create_challenge(
        &self,
        ctx: &SessionContext,
        draft: &ChallengeDraft,
    ) -> Result<ChallengeId, DomainError> {
        let input = draft.validate()?;
        let creator = ctx.require()?;
        let id = self.data.insert_challenge(ctx, &creator.uid, input).await?;
        info!(challenge_id = %id, created_by = %creator.uid, "challenge created");
        Ok(id)
    }

    /// Membership test, then set-union write. The check is a guard for the notice only;
    /// the write itself is duplicate-safe.
    pub async fn join_challenge(
        &self,
        ctx: &SessionContext,
        id: &ChallengeId,
    ) -> Result<JoinOutcome, DomainError> {
        let identity = ctx.require()?;
        let challenge = self
            .data
            .fetch_challenge(ctx, id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("challenge {}", id)))?;
        if challenge.has_participant(&identity.uid) {
            info!(challenge_id = %id, uid = %identity.uid, "already joined");
            return Ok(JoinOutcome::AlreadyJoined);
        }
        self.data.add_participant(ctx, id, &identity.uid).await?;
        info!(challenge_id = %id, uid = %identity.uid, "joined challenge");
        Ok(JoinOutcome::Joined)
    }
}
