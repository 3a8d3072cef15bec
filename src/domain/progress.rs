//! Progress aggregates derived from the entry log.
//!
//! Completion is the sum of an account's entry values against the challenge target,
//! capped at 100%. Nothing here is stored; every figure is recomputed from entries.

use crate::domain::{AccountId, AgeGroup, Challenge, ChallengeId, ProgressEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeProgress {
    pub challenge_id: ChallengeId,
    pub total: f64,
    pub entries: usize,
    pub percent: f64,
}

impl ChallengeProgress {
    pub fn is_complete(&self) -> bool {
        self.percent >= 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_challenges: usize,
    pub active_challenges: usize,
    pub completed_challenges: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub account: AccountId,
    pub total: f64,
}

/// Progress of `uid` on one challenge.
pub fn challenge_progress(
    uid: &AccountId,
    challenge: &Challenge,
    entries: &[ProgressEntry],
) -> ChallengeProgress {
    let mine = entries
        .iter()
        .filter(|e| &e.user_id == uid && e.challenge_id == challenge.id);
    let (total, count) = mine.fold((0.0, 0usize), |(sum, n), e| (sum + e.value, n + 1));
    let percent = if challenge.target_value > 0.0 {
        (total / challenge.target_value * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    ChallengeProgress {
        challenge_id: challenge.id.clone(),
        total,
        entries: count,
        percent,
    }
}

/// Challenges whose participant set contains `uid`.
pub fn joined<'a>(uid: &AccountId, challenges: &'a [Challenge]) -> Vec<&'a Challenge> {
    challenges.iter().filter(|c| c.has_participant(uid)).collect()
}

/// Challenges not yet joined, optionally narrowed to an age group (display filter only).
pub fn explorable<'a>(
    uid: &AccountId,
    challenges: &'a [Challenge],
    age_filter: Option<AgeGroup>,
) -> Vec<&'a Challenge> {
    challenges
        .iter()
        .filter(|c| !c.has_participant(uid))
        .filter(|c| age_filter.is_none_or(|age| c.is_eligible(age)))
        .collect()
}

pub fn dashboard_stats(
    uid: &AccountId,
    challenges: &[Challenge],
    entries: &[ProgressEntry],
    now: DateTime<Utc>,
) -> DashboardStats {
    let mine = joined(uid, challenges);
    let total = mine.len();
    let mut completed = 0;
    let mut active = 0;
    for challenge in mine {
        let progress = challenge_progress(uid, challenge, entries);
        if progress.is_complete() {
            completed += 1;
        } else if challenge.ends_at().is_none_or(|end| now < end) {
            active += 1;
        }
    }
    let completion_rate = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    };
    DashboardStats {
        total_challenges: total,
        active_challenges: active,
        completed_challenges: completed,
        completion_rate,
    }
}

/// Participants ranked by summed entry values, highest first; ties ordered by account id.
/// Participants with no entries are listed with a zero total.
pub fn leaderboard(challenge: &Challenge, entries: &[ProgressEntry]) -> Vec<LeaderboardRow> {
    let mut totals: HashMap<&AccountId, f64> =
        challenge.participants.iter().map(|p| (p, 0.0)).collect();
    for entry in entries.iter().filter(|e| e.challenge_id == challenge.id) {
        if let Some(total) = totals.get_mut(&entry.user_id) {
            *total += entry.value;
        }
    }
    let mut rows: Vec<(&AccountId, f64)> = totals.into_iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows.into_iter()
        .enumerate()
        .map(|(i, (account, total))| LeaderboardRow {
            rank: i + 1,
            account: account.clone(),
            total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, GoalType};
    use chrono::Duration;

    fn challenge(id: &str, target: f64, participants: &[&str]) -> Challenge {
        Challenge {
            id: ChallengeId::new(id),
            name: id.to_uppercase(),
            description: String::new(),
            goal_type: GoalType::Steps,
            target_value: target,
            duration_days: 7,
            age_groups: vec![AgeGroup::Adults],
            difficulty_level: Difficulty::Easy,
            created_by: AccountId::new("owner"),
            created_at: Utc::now(),
            participants: participants.iter().map(|p| AccountId::new(*p)).collect(),
        }
    }

    fn entry(user: &str, challenge: &str, value: f64) -> ProgressEntry {
        ProgressEntry {
            id: format!("{user}-{challenge}-{value}"),
            user_id: AccountId::new(user),
            challenge_id: ChallengeId::new(challenge),
            value,
            notes: None,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn percent_sums_own_entries_and_caps() {
        let c = challenge("c1", 100.0, &["me", "you"]);
        let entries = vec![
            entry("me", "c1", 30.0),
            entry("me", "c1", 25.0),
            entry("you", "c1", 90.0),
            entry("me", "other", 500.0),
        ];
        let p = challenge_progress(&AccountId::new("me"), &c, &entries);
        assert_eq!(p.total, 55.0);
        assert_eq!(p.entries, 2);
        assert_eq!(p.percent, 55.0);

        let over = vec![entry("me", "c1", 250.0)];
        assert_eq!(challenge_progress(&AccountId::new("me"), &c, &over).percent, 100.0);
    }

    #[test]
    fn stats_split_active_and_completed() {
        let me = AccountId::new("me");
        let mut expired = challenge("old", 10.0, &["me"]);
        expired.created_at = Utc::now() - Duration::days(30);
        let challenges = vec![
            challenge("done", 10.0, &["me"]),
            challenge("running", 10.0, &["me"]),
            expired,
            challenge("not-mine", 10.0, &["you"]),
        ];
        let entries = vec![entry("me", "done", 10.0), entry("me", "running", 2.0)];
        let stats = dashboard_stats(&me, &challenges, &entries, Utc::now());
        assert_eq!(stats.total_challenges, 3);
        assert_eq!(stats.completed_challenges, 1);
        assert_eq!(stats.active_challenges, 1);
        assert!((stats.completion_rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn far_future_end_counts_as_active() {
        let me = AccountId::new("me");
        let mut endless = challenge("endless", 10.0, &["me"]);
        endless.duration_days = u32::MAX;
        assert_eq!(endless.ends_at(), None);
        let stats = dashboard_stats(&me, &[endless], &[entry("me", "endless", 1.0)], Utc::now());
        assert_eq!(stats.total_challenges, 1);
        assert_eq!(stats.active_challenges, 1);
        assert_eq!(stats.completed_challenges, 0);
    }

    #[test]
    fn stats_without_challenges_are_zero() {
        let stats = dashboard_stats(&AccountId::new("me"), &[], &[], Utc::now());
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn explore_hides_joined_and_filters_by_age() {
        let me = AccountId::new("me");
        let mut kids = challenge("kids", 1.0, &[]);
        kids.age_groups = vec![AgeGroup::Kids];
        let challenges = vec![challenge("mine", 1.0, &["me"]), kids, challenge("adults", 1.0, &[])];
        let all: Vec<_> = explorable(&me, &challenges, None).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(all, vec!["kids", "adults"]);
        let adults: Vec<_> = explorable(&me, &challenges, Some(AgeGroup::Adults))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(adults, vec!["adults"]);
    }

    #[test]
    fn leaderboard_ranks_participants_only() {
        let c = challenge("c1", 100.0, &["b", "a", "idle"]);
        let entries = vec![
            entry("a", "c1", 40.0),
            entry("b", "c1", 40.0),
            entry("b", "c1", 5.0),
            entry("stranger", "c1", 1000.0),
        ];
        let rows = leaderboard(&c, &entries);
        let order: Vec<_> = rows.iter().map(|r| (r.rank, r.account.as_str(), r.total)).collect();
        assert_eq!(order, vec![(1, "b", 45.0), (2, "a", 40.0), (3, "idle", 0.0)]);
    }
}
