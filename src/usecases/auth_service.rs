//! Register / login / logout. Delegates credentials to the IdentityProvider port.
//!
//! Registration is two independent writes: identity creation, then the Account profile.
//! The profile write is an idempotent upsert keyed by uid and is retried on its own;
//! if it still fails the identity stays signed in and the caller keeps the profile pending.

use crate::domain::{
    Account, AgeGroup, DomainError, FitnessLevel, Identity, SessionContext, validation,
};
use crate::ports::IdentityProvider;
use crate::usecases::DataAccess;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Raw registration input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub age_group: Option<AgeGroup>,
    pub fitness_level: Option<FitnessLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterOutcome {
    pub identity: Identity,
    pub account: Account,
    /// False when every profile write attempt failed.
    pub profile_saved: bool,
}

pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    data: DataAccess,
    profile_attempts: u32,
    retry_delay: Duration,
}

impl AuthService {
    /// # Arguments
    /// * `identity` - identity provider adapter
    /// * `data` - data access layer for the profile record
    /// * `profile_attempts` - total tries for the profile upsert (at least 1)
    /// * `retry_delay` - base delay, multiplied by the attempt number
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        data: DataAccess,
        profile_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            identity,
            data,
            profile_attempts: profile_attempts.max(1),
            retry_delay,
        }
    }

    /// Session established before this process started, if any.
    pub async fn current_identity(&self) -> Result<Option<Identity>, DomainError> {
        self.identity.current_identity().await
    }

    pub async fn register(&self, form: Registration) -> Result<RegisterOutcome, DomainError> {
        let email = validation::email(&form.email)?;
        let password = validation::password(&form.password)?;
        let full_name = validation::required("full_name", &form.full_name)?.to_string();
        let age_group = form
            .age_group
            .ok_or_else(|| DomainError::validation("age_group", "is required"))?;
        let fitness_level = form
            .fitness_level
            .ok_or_else(|| DomainError::validation("fitness_level", "is required"))?;

        let identity = self.identity.create_identity(&email, password).await?;
        let account = Account {
            uid: identity.uid.clone(),
            full_name,
            age_group,
            fitness_level,
            email,
            created_at: Utc::now(),
        };
        let ctx = SessionContext::signed_in(identity.clone());
        let profile_saved = match self.save_profile(&ctx, &account).await {
            Ok(()) => true,
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "profile write failed; identity has no profile yet");
                false
            }
        };
        info!(uid = %identity.uid, profile_saved, "registered");
        Ok(RegisterOutcome {
            identity,
            account,
            profile_saved,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        let email = validation::required("email", email)?;
        let password = validation::password(password)?;
        let identity = self.identity.authenticate(email, password).await?;
        info!(uid = %identity.uid, "signed in");
        Ok(identity)
    }

    pub async fn logout(&self, ctx: &SessionContext) -> Result<(), DomainError> {
        if let Some(identity) = ctx.identity() {
            self.identity.end_session(identity).await?;
            info!(uid = %identity.uid, "signed out");
        }
        Ok(())
    }

    /// Upsert the profile, retrying with linear backoff.
    pub async fn save_profile(&self, ctx: &SessionContext, account: &Account) -> Result<(), DomainError> {
        let mut attempt = 1;
        loop {
            match self.data.upsert_account(ctx, account).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.profile_attempts => {
                    warn!(uid = %account.uid, attempt, error = %e, "profile write failed, retrying");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn load_profile(&self, ctx: &SessionContext) -> Result<Option<Account>, DomainError> {
        let identity = ctx.require()?;
        self.data.fetch_account(ctx, &identity.uid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryDocumentStore, MemoryIdentityProvider};
    use crate::domain::AuthFailure;
    use crate::ports::Collection;

    struct Fixture {
        idp: Arc<MemoryIdentityProvider>,
        store: Arc<MemoryDocumentStore>,
        service: AuthService,
    }

    fn fixture(attempts: u32) -> Fixture {
        let idp = Arc::new(MemoryIdentityProvider::new());
        let store = Arc::new(MemoryDocumentStore::new());
        let service = AuthService::new(
            idp.clone(),
            DataAccess::new(store.clone()),
            attempts,
            Duration::from_millis(1),
        );
        Fixture { idp, store, service }
    }

    fn jane() -> Registration {
        Registration {
            email: "a@b.com".into(),
            password: "Secret123".into(),
            full_name: "Jane".into(),
            age_group: Some(AgeGroup::Adults),
            fitness_level: Some(FitnessLevel::Beginner),
        }
    }

    #[tokio::test]
    async fn register_creates_identity_and_profile() {
        let f = fixture(3);
        let out = f.service.register(jane()).await.unwrap();
        assert!(out.profile_saved);
        assert_eq!(f.idp.identity_count().await, 1);
        assert_eq!(f.store.count(Collection::Accounts).await, 1);

        let ctx = SessionContext::signed_in(out.identity.clone());
        let profile = f.service.load_profile(&ctx).await.unwrap().unwrap();
        assert_eq!(profile.full_name, "Jane");
        assert_eq!(profile.age_group, AgeGroup::Adults);
        assert_eq!(profile.fitness_level, FitnessLevel::Beginner);
        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.uid, out.identity.uid);
    }

    #[tokio::test]
    async fn validation_happens_before_provider_call() {
        let f = fixture(3);
        let mut form = jane();
        form.age_group = None;
        assert!(matches!(
            f.service.register(form).await,
            Err(DomainError::Validation { field: "age_group", .. })
        ));
        let mut form = jane();
        form.email = "not-an-email".into();
        assert!(matches!(
            f.service.register(form).await,
            Err(DomainError::Validation { field: "email", .. })
        ));
        assert_eq!(f.idp.identity_count().await, 0);
    }

    #[tokio::test]
    async fn profile_write_is_retried() {
        let f = fixture(3);
        f.store.fail_next_writes(2);
        let out = f.service.register(jane()).await.unwrap();
        assert!(out.profile_saved);
        assert_eq!(f.store.count(Collection::Accounts).await, 1);
    }

    #[tokio::test]
    async fn exhausted_profile_retries_keep_identity() {
        let f = fixture(2);
        f.store.fail_next_writes(2);
        let out = f.service.register(jane()).await.unwrap();
        assert!(!out.profile_saved);
        assert_eq!(f.idp.identity_count().await, 1);
        assert_eq!(f.store.count(Collection::Accounts).await, 0);

        // a later retry completes the pair
        let ctx = SessionContext::signed_in(out.identity);
        f.service.save_profile(&ctx, &out.account).await.unwrap();
        assert_eq!(f.store.count(Collection::Accounts).await, 1);
    }

    #[tokio::test]
    async fn login_and_logout() {
        let f = fixture(1);
        f.service.register(jane()).await.unwrap();
        assert_eq!(
            f.service.login("a@b.com", "wrong-pass").await.unwrap_err(),
            DomainError::Auth(AuthFailure::InvalidCredentials)
        );
        assert!(matches!(
            f.service.login("", "x").await,
            Err(DomainError::Validation { field: "email", .. })
        ));
        let identity = f.service.login("a@b.com", "Secret123").await.unwrap();
        f.service
            .logout(&SessionContext::signed_in(identity))
            .await
            .unwrap();
        assert_eq!(f.service.current_identity().await.unwrap(), None);
    }
}
