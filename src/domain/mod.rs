//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod guidelines;
pub mod progress;
pub mod session;
pub mod validation;

pub use entities::{
    Account, AccountId, AgeGroup, Challenge, ChallengeId, Difficulty, FitnessLevel, GoalType,
    HealthWarning, NewChallenge, ProgressEntry, Severity,
};
pub use errors::{AuthFailure, DomainError};
pub use session::{Identity, SessionContext};
