//! Owns the application state and runs user actions against the use cases.
//!
//! Every handler follows the same shape: snapshot, raise the loading flag, await the call,
//! then either dispatch the result actions or roll back to the snapshot with an error notice.
//! In-flight calls are never cancelled; a late result is applied to whatever state is current.

use crate::app::bootstrap;
use crate::app::state::{Action, AppState, Notice, reduce};
use crate::domain::progress::{self, LeaderboardRow};
use crate::domain::{ChallengeId, DomainError, SessionContext};
use crate::ports::{DocumentStore, IdentityProvider};
use crate::usecases::{
    AuthService, ChallengeService, DataAccess, JoinOutcome, ProgressService, WarningService,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const PROFILE_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Use cases shared by the controller and its in-flight calls.
pub struct Services {
    pub auth: AuthService,
    pub challenges: ChallengeService,
    pub progress: ProgressService,
    pub warnings: WarningService,
}

impl Services {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        profile_attempts: u32,
    ) -> Self {
        Self::with_retry_delay(identity, store, profile_attempts, PROFILE_RETRY_DELAY)
    }

    pub fn with_retry_delay(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        profile_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        let data = DataAccess::new(store);
        Self {
            auth: AuthService::new(identity, data.clone(), profile_attempts, retry_delay),
            challenges: ChallengeService::new(data.clone()),
            progress: ProgressService::new(data.clone()),
            warnings: WarningService::new(data),
        }
    }
}

pub struct AppController {
    services: Arc<Services>,
    state: AppState,
}

impl AppController {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, action);
    }

    /// Select the initial view; a resumed session loads the challenge list.
    pub async fn start(&mut self) {
        self.state = bootstrap::initial_state(&self.services.auth).await;
        if self.state.identity.is_some() {
            self.load_challenges().await;
        }
    }

    async fn attempt<T>(
        &mut self,
        label: &'static str,
        call: impl Future<Output = Result<T, DomainError>>,
    ) -> Option<T> {
        let snapshot = self.state.clone();
        self.dispatch(Action::RequestStarted);
        let result = call.await;
        self.dispatch(Action::RequestFinished);
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(action = label, error = %e, "action failed");
                self.dispatch(Action::Rollback(Box::new(snapshot)));
                self.dispatch(Action::Notify(Notice::error(format!("{} failed: {}", label, e))));
                None
            }
        }
    }

    pub async fn register(&mut self) {
        let form = self.state.register_form.to_registration();
        let services = Arc::clone(&self.services);
        let Some(outcome) = self
            .attempt("Registration", async move { services.auth.register(form).await })
            .await
        else {
            return;
        };
        let name = outcome.account.full_name.clone();
        self.dispatch(Action::Authenticated(outcome.identity));
        if outcome.profile_saved {
            self.dispatch(Action::AccountLoaded(Some(outcome.account)));
            self.dispatch(Action::Notify(Notice::success(format!(
                "Welcome to FitTogether, {}!",
                name
            ))));
        } else {
            self.dispatch(Action::ProfilePending(outcome.account));
            self.dispatch(Action::Notify(Notice::warning(
                "Signed in, but your profile could not be saved yet. It will be retried on refresh.",
            )));
        }
        self.load_challenges().await;
    }

    pub async fn login(&mut self) {
        let email = self.state.login_form.email.clone();
        let password = self.state.login_form.password.clone();
        let services = Arc::clone(&self.services);
        let Some(identity) = self
            .attempt("Login", async move { services.auth.login(&email, &password).await })
            .await
        else {
            return;
        };
        let ctx = SessionContext::signed_in(identity.clone());
        self.dispatch(Action::Authenticated(identity));
        let notice = match self.services.auth.load_profile(&ctx).await {
            Ok(account) => {
                self.dispatch(Action::AccountLoaded(account));
                Notice::success("Welcome back!")
            }
            Err(e) => {
                warn!(error = %e, "profile load failed");
                Notice::warning(format!(
                    "Signed in, but your profile could not be loaded: {}. It will be retried on refresh.",
                    e
                ))
            }
        };
        self.dispatch(Action::Notify(notice));
        self.refresh().await;
    }

    /// Ends the provider session, then lands. Lands even if the provider call fails.
    pub async fn logout(&mut self) {
        let ctx = self.state.session();
        self.dispatch(Action::RequestStarted);
        let result = self.services.auth.logout(&ctx).await;
        self.dispatch(Action::RequestFinished);
        self.dispatch(Action::SignedOut);
        match result {
            Ok(()) => self.dispatch(Action::Notify(Notice::info("Signed out"))),
            Err(e) => {
                warn!(error = %e, "provider sign-out failed");
                self.dispatch(Action::Notify(Notice::warning(format!(
                    "Signed out locally; provider reported: {}",
                    e
                ))));
            }
        }
    }

    /// Local only: the provider session stays valid.
    pub fn navigate_home(&mut self) {
        self.dispatch(Action::NavigatedHome);
    }

    /// Full replacement of the challenge list.
    pub async fn load_challenges(&mut self) {
        let ctx = self.state.session();
        let services = Arc::clone(&self.services);
        if let Some(challenges) = self
            .attempt("Loading challenges", async move {
                services.challenges.list_challenges(&ctx).await
            })
            .await
        {
            self.dispatch(Action::ChallengesLoaded(challenges));
        }
    }

    /// Reload every dashboard collection. Retries a pending profile write first.
    pub async fn refresh(&mut self) {
        let ctx = self.state.session();
        if let Some(account) = self.state.pending_profile.clone() {
            match self.services.auth.save_profile(&ctx, &account).await {
                Ok(()) => {
                    info!(uid = %account.uid, "pending profile saved");
                    self.dispatch(Action::ProfileSaved);
                }
                Err(e) => warn!(uid = %account.uid, error = %e, "pending profile still unsaved"),
            }
        }
        let load_account = self.state.account.is_none() && self.state.pending_profile.is_none();
        let services = Arc::clone(&self.services);
        let loaded = self
            .attempt("Refresh", async move {
                let account = if load_account {
                    services.auth.load_profile(&ctx).await?
                } else {
                    None
                };
                let challenges = services.challenges.list_challenges(&ctx).await?;
                let progress = services.progress.my_progress(&ctx).await?;
                let warnings = services.warnings.list_warnings(&ctx).await?;
                Ok((account, challenges, progress, warnings))
            })
            .await;
        if let Some((account, challenges, progress, warnings)) = loaded {
            if account.is_some() {
                self.dispatch(Action::AccountLoaded(account));
            }
            self.dispatch(Action::ChallengesLoaded(challenges));
            self.dispatch(Action::ProgressLoaded(progress));
            self.dispatch(Action::WarningsLoaded(warnings));
        }
    }

    pub async fn create_challenge(&mut self) {
        let draft = self.state.challenge_form.to_draft();
        let ctx = self.state.session();
        let services = Arc::clone(&self.services);
        if self
            .attempt("Creating challenge", async move {
                services.challenges.create_challenge(&ctx, &draft).await
            })
            .await
            .is_none()
        {
            return;
        }
        self.dispatch(Action::ChallengeCreated);
        self.dispatch(Action::Notify(Notice::success("Challenge created!")));
        self.load_challenges().await;
    }

    pub async fn join_challenge(&mut self, id: &ChallengeId) {
        let ctx = self.state.session();
        let services = Arc::clone(&self.services);
        let target = id.clone();
        let Some(outcome) = self
            .attempt("Joining challenge", async move {
                services.challenges.join_challenge(&ctx, &target).await
            })
            .await
        else {
            return;
        };
        match outcome {
            JoinOutcome::AlreadyJoined => {
                self.dispatch(Action::Notify(Notice::info(
                    "You have already joined this challenge!",
                )));
            }
            JoinOutcome::Joined => {
                self.dispatch(Action::Notify(Notice::success("Successfully joined challenge!")));
                self.load_challenges().await;
            }
        }
    }

    /// Participants of a loaded challenge ranked by their summed progress.
    pub async fn leaderboard(&mut self, id: &ChallengeId) -> Option<Vec<LeaderboardRow>> {
        let challenge = self.state.challenges.iter().find(|c| &c.id == id)?.clone();
        let ctx = self.state.session();
        let services = Arc::clone(&self.services);
        let entries = self
            .attempt("Loading leaderboard", async move {
                services.progress.all_progress(&ctx).await
            })
            .await?;
        Some(progress::leaderboard(&challenge, &entries))
    }

    /// Only challenges the account has joined may be selected.
    pub async fn log_progress(&mut self) {
        let form = self.state.progress_form.clone();
        let joined: Vec<ChallengeId> = self
            .state
            .my_challenges()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        let ctx = self.state.session();
        let services = Arc::clone(&self.services);
        let Some(entry) = self
            .attempt("Logging progress", async move {
                let challenge_id = form
                    .challenge_id
                    .ok_or_else(|| DomainError::validation("challenge_id", "is required"))?;
                if !joined.contains(&challenge_id) {
                    return Err(DomainError::validation(
                        "challenge_id",
                        "must be one of your joined challenges",
                    ));
                }
                services
                    .progress
                    .log_progress(&ctx, &challenge_id, &form.value, &form.notes)
                    .await
            })
            .await
        else {
            return;
        };
        self.dispatch(Action::ProgressLogged(entry));
        self.dispatch(Action::Notify(Notice::success("Progress logged successfully!")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryDocumentStore, MemoryIdentityProvider};
    use crate::app::state::{
        ChallengeForm, DashboardTab, LoginForm, NoticeKind, ProgressForm, RegisterForm, View,
    };
    use crate::domain::{AgeGroup, FitnessLevel, Identity};
    use crate::ports::Collection;

    struct Harness {
        idp: Arc<MemoryIdentityProvider>,
        store: Arc<MemoryDocumentStore>,
        services: Arc<Services>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with(MemoryIdentityProvider::new(), MemoryDocumentStore::new(), 3)
        }

        fn with(idp: MemoryIdentityProvider, store: MemoryDocumentStore, attempts: u32) -> Self {
            let idp = Arc::new(idp);
            let store = Arc::new(store);
            let services = Arc::new(Services::with_retry_delay(
                idp.clone(),
                store.clone(),
                attempts,
                Duration::from_millis(1),
            ));
            Self { idp, store, services }
        }

        fn controller(&self) -> AppController {
            AppController::new(Arc::clone(&self.services))
        }
    }

    fn jane_form() -> RegisterForm {
        RegisterForm {
            email: "a@b.com".into(),
            password: "Secret123".into(),
            full_name: "Jane".into(),
            age_group: Some(AgeGroup::Adults),
            fitness_level: Some(FitnessLevel::Beginner),
        }
    }

    fn walking_form() -> ChallengeForm {
        ChallengeForm {
            name: "Test Walking Challenge".into(),
            description: "Walk 10,000 steps daily".into(),
            target_value: "70000".into(),
            duration_days: "7".into(),
            age_groups: vec![AgeGroup::Adults],
            ..ChallengeForm::default()
        }
    }

    async fn registered(h: &Harness, email: &str) -> AppController {
        let mut app = h.controller();
        app.dispatch(Action::EditRegister(RegisterForm {
            email: email.into(),
            ..jane_form()
        }));
        app.register().await;
        assert_eq!(app.state().view, View::Dashboard);
        app
    }

    async fn with_challenge(h: &Harness) -> (AppController, ChallengeId) {
        let mut app = registered(h, "a@b.com").await;
        app.dispatch(Action::EditChallenge(walking_form()));
        app.create_challenge().await;
        let id = app.state().challenges[0].id.clone();
        (app, id)
    }

    #[tokio::test]
    async fn registration_scenario() {
        let h = Harness::new();
        let app = registered(&h, "a@b.com").await;

        assert_eq!(h.idp.identity_count().await, 1);
        assert_eq!(h.store.count(Collection::Accounts).await, 1);
        let account = app.state().account.clone().unwrap();
        assert_eq!(account.full_name, "Jane");
        assert_eq!(account.age_group, AgeGroup::Adults);
        assert_eq!(account.fitness_level, FitnessLevel::Beginner);
        assert_eq!(account.email, "a@b.com");
        assert!(!app.state().ui.loading);
        assert_eq!(app.state().notice.as_ref().unwrap().kind, NoticeKind::Success);
    }

    #[tokio::test]
    async fn duplicate_registration_stays_on_landing() {
        let h = Harness::new();
        registered(&h, "a@b.com").await;

        let mut app = h.controller();
        app.dispatch(Action::EditRegister(jane_form()));
        app.register().await;
        assert_eq!(app.state().view, View::Landing);
        assert!(app.state().identity.is_none());
        let notice = app.state().notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("already exists"));
        assert_eq!(app.state().register_form.full_name, "Jane");
        assert_eq!(h.idp.identity_count().await, 1);
    }

    #[tokio::test]
    async fn login_failure_keeps_identity_unchanged() {
        let h = Harness::new();
        registered(&h, "a@b.com").await;
        let mut app = h.controller();
        app.dispatch(Action::EditLogin(LoginForm {
            email: "a@b.com".into(),
            password: "nope-nope".into(),
        }));
        app.login().await;
        assert_eq!(app.state().view, View::Landing);
        assert!(app.state().identity.is_none());

        app.dispatch(Action::EditLogin(LoginForm {
            email: "a@b.com".into(),
            password: "Secret123".into(),
        }));
        app.login().await;
        assert_eq!(app.state().view, View::Dashboard);
        assert_eq!(app.state().account.as_ref().unwrap().full_name, "Jane");
    }

    #[tokio::test]
    async fn login_reports_profile_load_failure() {
        let h = Harness::new();
        registered(&h, "a@b.com").await;
        let mut app = h.controller();
        app.dispatch(Action::EditLogin(LoginForm {
            email: "a@b.com".into(),
            password: "Secret123".into(),
        }));
        h.store.fail_next_reads(1);
        app.login().await;

        assert_eq!(app.state().view, View::Dashboard);
        let notice = app.state().notice.as_ref().unwrap();
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert!(notice.message.contains("profile could not be loaded"));
        // the refresh that follows loads it
        assert_eq!(app.state().account.as_ref().unwrap().full_name, "Jane");
    }

    #[tokio::test]
    async fn created_challenge_is_listed_with_no_participants() {
        let h = Harness::new();
        let (app, id) = with_challenge(&h).await;
        let created = app.state().challenges.iter().find(|c| c.id == id).unwrap();
        assert!(created.participants.is_empty());
        assert_eq!(app.state().notice, Some(Notice::success("Challenge created!")));
    }

    #[tokio::test]
    async fn second_join_reports_already_joined() {
        let h = Harness::new();
        let (mut app, id) = with_challenge(&h).await;

        app.join_challenge(&id).await;
        assert_eq!(app.state().notice.as_ref().unwrap().kind, NoticeKind::Success);
        let after_first = app.state().challenges.clone();
        assert_eq!(after_first[0].participants.len(), 1);

        app.join_challenge(&id).await;
        assert_eq!(
            app.state().notice,
            Some(Notice::info("You have already joined this challenge!"))
        );
        app.load_challenges().await;
        assert_eq!(app.state().challenges, after_first);
    }

    #[tokio::test]
    async fn log_progress_leaves_challenge_untouched() {
        let h = Harness::new();
        let (mut app, id) = with_challenge(&h).await;
        app.join_challenge(&id).await;

        let ctx = app.state().session();
        let before = h
            .store
            .fetch_by_id(&ctx, Collection::Challenges, id.as_str())
            .await
            .unwrap();
        app.dispatch(Action::EditProgress(ProgressForm {
            challenge_id: Some(id.clone()),
            value: "5000".into(),
            notes: "morning walk".into(),
        }));
        app.log_progress().await;
        let after = h
            .store
            .fetch_by_id(&ctx, Collection::Challenges, id.as_str())
            .await
            .unwrap();

        assert_eq!(before, after);
        assert_eq!(h.store.count(Collection::Progress).await, 1);
        assert_eq!(app.state().progress_form, ProgressForm::default());
        let challenge = app.state().my_challenges()[0].clone();
        assert_eq!(app.state().progress_for(&challenge).unwrap().total, 5000.0);
    }

    #[tokio::test]
    async fn failed_progress_keeps_form_and_notifies() {
        let h = Harness::new();
        let (mut app, id) = with_challenge(&h).await;
        app.join_challenge(&id).await;
        let form = ProgressForm {
            challenge_id: Some(id),
            value: "5000".into(),
            notes: "evening".into(),
        };
        app.dispatch(Action::EditProgress(form.clone()));
        h.store.set_unavailable(true);
        app.log_progress().await;

        assert_eq!(app.state().progress_form, form);
        assert!(app.state().progress.is_empty());
        assert!(!app.state().ui.loading);
        assert_eq!(app.state().notice.as_ref().unwrap().kind, NoticeKind::Error);
        assert_eq!(app.state().view, View::Dashboard);
    }

    #[tokio::test]
    async fn progress_requires_a_joined_challenge() {
        let h = Harness::new();
        let (mut app, id) = with_challenge(&h).await;
        app.dispatch(Action::EditProgress(ProgressForm {
            challenge_id: Some(id),
            value: "10".into(),
            notes: String::new(),
        }));
        app.log_progress().await;
        assert_eq!(app.state().notice.as_ref().unwrap().kind, NoticeKind::Error);
        assert_eq!(h.store.count(Collection::Progress).await, 0);
    }

    #[tokio::test]
    async fn logout_from_any_tab_lands() {
        let h = Harness::new();
        for tab in DashboardTab::ALL {
            let mut app = registered(&h, &format!("{}@b.com", tab.title().replace(' ', ""))).await;
            app.dispatch(Action::SelectTab(tab));
            app.dispatch(Action::OpenCreateDialog);
            app.logout().await;
            assert_eq!(app.state().view, View::Landing);
            assert!(app.state().identity.is_none());
            assert!(app.state().challenges.is_empty());
            assert_eq!(h.services.auth.current_identity().await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn navigate_home_keeps_provider_session() {
        let h = Harness::new();
        let mut app = registered(&h, "a@b.com").await;
        app.navigate_home();
        assert_eq!(app.state().view, View::Landing);
        assert!(app.state().identity.is_none());
        assert!(h.services.auth.current_identity().await.unwrap().is_some());

        let mut resumed = h.controller();
        resumed.start().await;
        assert_eq!(resumed.state().view, View::Dashboard);
    }

    #[tokio::test]
    async fn concurrent_joins_from_two_controllers() {
        let h = Harness::with(
            MemoryIdentityProvider::new(),
            MemoryDocumentStore::with_latency(Duration::from_millis(5)),
            3,
        );
        let (_owner, id) = with_challenge(&h).await;
        let mut alice = h.controller();
        alice.dispatch(Action::Authenticated(Identity::new("alice", "alice@b.com")));
        let mut bob = h.controller();
        bob.dispatch(Action::Authenticated(Identity::new("bob", "bob@b.com")));

        tokio::join!(alice.join_challenge(&id), bob.join_challenge(&id));

        alice.load_challenges().await;
        let participants = &alice.state().challenges[0].participants;
        assert_eq!(participants.len(), 2);
        assert!(participants.iter().any(|p| p.as_str() == "alice"));
        assert!(participants.iter().any(|p| p.as_str() == "bob"));
    }

    #[tokio::test]
    async fn leaderboard_ranks_participants() {
        let h = Harness::new();
        let (mut app, id) = with_challenge(&h).await;
        app.join_challenge(&id).await;
        app.dispatch(Action::EditProgress(ProgressForm {
            challenge_id: Some(id.clone()),
            value: "700".into(),
            notes: String::new(),
        }));
        app.log_progress().await;

        let rows = app.leaderboard(&id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].total, 700.0);
        assert!(app.leaderboard(&ChallengeId::new("missing")).await.is_none());
    }

    #[tokio::test]
    async fn pending_profile_is_saved_on_refresh() {
        let h = Harness::with(MemoryIdentityProvider::new(), MemoryDocumentStore::new(), 1);
        h.store.fail_next_writes(1);
        let mut app = h.controller();
        app.dispatch(Action::EditRegister(jane_form()));
        app.register().await;

        assert_eq!(app.state().view, View::Dashboard);
        assert!(app.state().pending_profile.is_some());
        assert_eq!(app.state().notice.as_ref().unwrap().kind, NoticeKind::Warning);
        assert_eq!(h.store.count(Collection::Accounts).await, 0);

        app.refresh().await;
        assert!(app.state().pending_profile.is_none());
        assert_eq!(app.state().account.as_ref().unwrap().full_name, "Jane");
        assert_eq!(h.store.count(Collection::Accounts).await, 1);
    }
}
