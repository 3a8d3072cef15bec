//! Health warnings. Read-only; documents are seeded outside the app.

use crate::domain::{AgeGroup, DomainError, HealthWarning, SessionContext};
use crate::usecases::DataAccess;

pub struct WarningService {
    data: DataAccess,
}

impl WarningService {
    pub fn new(data: DataAccess) -> Self {
        Self { data }
    }

    /// Most severe first, store order within a severity.
    pub async fn list_warnings(&self, ctx: &SessionContext) -> Result<Vec<HealthWarning>, DomainError> {
        let mut warnings = self.data.list_health_warnings(ctx).await?;
        warnings.sort_by_key(|w| std::cmp::Reverse(w.severity));
        Ok(warnings)
    }
}

/// Risks mentioning the account's age group label, falling back to all risks.
pub fn risks_for<'a>(warning: &'a HealthWarning, age_group: AgeGroup) -> Vec<&'a str> {
    let label = age_group.as_str();
    let matching: Vec<&str> = warning
        .age_specific_risks
        .iter()
        .map(String::as_str)
        .filter(|r| r.to_lowercase().contains(label))
        .collect();
    if matching.is_empty() {
        warning.age_specific_risks.iter().map(String::as_str).collect()
    } else {
        matching
    }
}
