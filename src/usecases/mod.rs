//! Application use cases. Orchestrate domain logic via ports.

pub mod auth_service;
pub mod challenge_service;
pub mod data_access;
pub mod progress_service;
pub mod warning_service;

pub use auth_service::{AuthService, RegisterOutcome, Registration};
pub use challenge_service::{ChallengeDraft, ChallengeService, JoinOutcome};
pub use data_access::DataAccess;
pub use progress_service::ProgressService;
pub use warning_service::WarningService;
