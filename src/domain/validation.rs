//! Input validation. Runs before any provider or store call.

use crate::domain::DomainError;

/// Trims and rejects empty input.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    Ok(trimmed)
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no whitespace.
/// The identity provider remains the authority on deliverability.
pub fn email(value: &str) -> Result<String, DomainError> {
    let value = required("email", value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("email", "must not contain spaces"));
    }
    let (local, domain) = value
        .split_once('@')
        .ok_or_else(|| DomainError::validation("email", "must contain '@'"))?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok {
        return Err(DomainError::validation("email", "is not a valid address"));
    }
    Ok(value.to_string())
}

/// Password length policy belongs to the provider; here we only require something.
pub fn password(value: &str) -> Result<&str, DomainError> {
    if value.is_empty() {
        return Err(DomainError::validation("password", "is required"));
    }
    Ok(value)
}

/// Finite decimal number.
pub fn number(field: &'static str, value: &str) -> Result<f64, DomainError> {
    let raw = required(field, value)?;
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(DomainError::validation(field, "must be a number")),
    }
}

pub fn positive_number(field: &'static str, value: &str) -> Result<f64, DomainError> {
    let n = number(field, value)?;
    if n <= 0.0 {
        return Err(DomainError::validation(field, "must be greater than zero"));
    }
    Ok(n)
}

/// Upper bound on a challenge's length (about a century).
pub const MAX_DURATION_DAYS: u32 = 36_500;

pub fn positive_days(field: &'static str, value: &str) -> Result<u32, DomainError> {
    let raw = required(field, value)?;
    match raw.parse::<u32>() {
        Ok(0) => Err(DomainError::validation(field, "must be at least 1")),
        Ok(n) if n > MAX_DURATION_DAYS => {
            Err(DomainError::validation(field, "must be at most 36500 days"))
        }
        Ok(n) => Ok(n),
        Err(_) => Err(DomainError::validation(field, "must be a whole number of days")),
    }
}

/// `None` for blank notes.
pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
