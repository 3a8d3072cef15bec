//! Domain entities. Pure data structures for the core business.
//!
//! No store/provider types here; adapters map documents into these.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account reference issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document id of a challenge in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(pub String);

impl ChallengeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Kids,
    Youth,
    Adults,
    Seniors,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Kids,
        AgeGroup::Youth,
        AgeGroup::Adults,
        AgeGroup::Seniors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Kids => "kids",
            AgeGroup::Youth => "youth",
            AgeGroup::Adults => "adults",
            AgeGroup::Seniors => "seniors",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub const ALL: [FitnessLevel; 3] = [
        FitnessLevel::Beginner,
        FitnessLevel::Intermediate,
        FitnessLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "beginner",
            FitnessLevel::Intermediate => "intermediate",
            FitnessLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    #[default]
    Steps,
    Workouts,
    Cycling,
    Yoga,
    Strength,
}

impl GoalType {
    pub const ALL: [GoalType; 5] = [
        GoalType::Steps,
        GoalType::Workouts,
        GoalType::Cycling,
        GoalType::Yoga,
        GoalType::Strength,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Steps => "steps",
            GoalType::Workouts => "workouts",
            GoalType::Cycling => "cycling",
            GoalType::Yoga => "yoga",
            GoalType::Strength => "strength",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile record shadowing an identity. Keyed by `uid` in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub uid: AccountId,
    pub full_name: String,
    pub age_group: AgeGroup,
    pub fitness_level: FitnessLevel,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A goal definition that accounts may join.
///
/// `participants` has set semantics: an account appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub name: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_value: f64,
    pub duration_days: u32,
    #[serde(default)]
    pub age_groups: Vec<AgeGroup>,
    pub difficulty_level: Difficulty,
    pub created_by: AccountId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<AccountId>,
}

impl Challenge {
    pub fn has_participant(&self, uid: &AccountId) -> bool {
        self.participants.iter().any(|p| p == uid)
    }

    pub fn participants_count(&self) -> usize {
        self.participants.len()
    }

    /// Advisory only: joining is never refused on age group.
    pub fn is_eligible(&self, age_group: AgeGroup) -> bool {
        self.age_groups.is_empty() || self.age_groups.contains(&age_group)
    }

    /// `None` when the end falls outside the representable date range (never ends).
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .checked_add_signed(Duration::days(i64::from(self.duration_days)))
    }
}

/// Input for a challenge insert. Id, creator, timestamp and participants are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChallenge {
    pub name: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_value: f64,
    pub duration_days: u32,
    pub age_groups: Vec<AgeGroup>,
    pub difficulty_level: Difficulty,
}

/// One timestamped measurement. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub id: String,
    pub user_id: AccountId,
    pub challenge_id: ChallengeId,
    pub value: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        })
    }
}

/// Externally supplied, display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthWarning {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub age_specific_risks: Vec<String>,
    #[serde(default)]
    pub warning_image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(age_groups: Vec<AgeGroup>) -> Challenge {
        Challenge {
            id: ChallengeId::new("c1"),
            name: "Walk".into(),
            description: "Daily walk".into(),
            goal_type: GoalType::Steps,
            target_value: 70_000.0,
            duration_days: 7,
            age_groups,
            difficulty_level: Difficulty::Medium,
            created_by: AccountId::new("u1"),
            created_at: Utc::now(),
            participants: vec![AccountId::new("u2")],
        }
    }

    #[test]
    fn enums_use_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_value(AgeGroup::Seniors).unwrap(),
            serde_json::json!("seniors")
        );
        assert_eq!(
            serde_json::from_value::<GoalType>(serde_json::json!("cycling")).unwrap(),
            GoalType::Cycling
        );
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn eligibility_is_open_when_no_age_groups() {
        assert!(challenge(vec![]).is_eligible(AgeGroup::Kids));
        let c = challenge(vec![AgeGroup::Adults, AgeGroup::Youth]);
        assert!(c.is_eligible(AgeGroup::Youth));
        assert!(!c.is_eligible(AgeGroup::Seniors));
    }

    #[test]
    fn membership_and_end_date() {
        let c = challenge(vec![]);
        assert!(c.has_participant(&AccountId::new("u2")));
        assert!(!c.has_participant(&AccountId::new("u1")));
        assert_eq!(c.ends_at().unwrap() - c.created_at, Duration::days(7));
    }
}
