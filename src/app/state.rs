//! Application state and its pure transition function.
//!
//! `AppState` is a plain serializable value. Every mutation is an `Action` applied by
//! `reduce`; the controller owns the only live instance.

use crate::app::carousel;
use crate::domain::progress::{self, ChallengeProgress, DashboardStats};
use crate::domain::{
    Account, AgeGroup, Challenge, ChallengeId, Difficulty, FitnessLevel, GoalType, HealthWarning,
    Identity, ProgressEntry, SessionContext,
};
use crate::usecases::{ChallengeDraft, Registration};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Landing,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Dashboard navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTab {
    #[default]
    Overview,
    MyChallenges,
    LogProgress,
    Explore,
    HealthAlerts,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 5] = [
        DashboardTab::Overview,
        DashboardTab::MyChallenges,
        DashboardTab::LogProgress,
        DashboardTab::Explore,
        DashboardTab::HealthAlerts,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DashboardTab::Overview => "Overview",
            DashboardTab::MyChallenges => "My Challenges",
            DashboardTab::LogProgress => "Log Progress",
            DashboardTab::Explore => "Explore",
            DashboardTab::HealthAlerts => "Health Alerts",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            DashboardTab::Overview => DashboardTab::MyChallenges,
            DashboardTab::MyChallenges => DashboardTab::LogProgress,
            DashboardTab::LogProgress => DashboardTab::Explore,
            DashboardTab::Explore => DashboardTab::HealthAlerts,
            DashboardTab::HealthAlerts => DashboardTab::Overview,
        }
    }
}

impl fmt::Display for DashboardTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub full_name: String,
    pub age_group: Option<AgeGroup>,
    pub fitness_level: Option<FitnessLevel>,
}

impl RegisterForm {
    pub fn to_registration(&self) -> Registration {
        Registration {
            email: self.email.clone(),
            password: self.password.clone(),
            full_name: self.full_name.clone(),
            age_group: self.age_group,
            fitness_level: self.fitness_level,
        }
    }
}

/// Raw text buffers; parsed only when submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeForm {
    pub name: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_value: String,
    pub duration_days: String,
    pub age_groups: Vec<AgeGroup>,
    pub difficulty_level: Difficulty,
}

impl ChallengeForm {
    pub fn to_draft(&self) -> ChallengeDraft {
        ChallengeDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            goal_type: self.goal_type,
            target_value: self.target_value.clone(),
            duration_days: self.duration_days.clone(),
            age_groups: self.age_groups.clone(),
            difficulty_level: self.difficulty_level,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressForm {
    pub challenge_id: Option<ChallengeId>,
    pub value: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiFlags {
    pub auth_dialog_open: bool,
    pub auth_mode: AuthMode,
    pub show_password: bool,
    pub create_dialog_open: bool,
    pub active_tab: DashboardTab,
    pub explore_age_filter: Option<AgeGroup>,
    pub carousel_index: usize,
    /// Set for the duration of an outstanding provider/store call.
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub view: View,
    pub identity: Option<Identity>,
    pub account: Option<Account>,
    pub challenges: Vec<Challenge>,
    /// Entries logged by the signed-in account.
    pub progress: Vec<ProgressEntry>,
    pub warnings: Vec<HealthWarning>,
    pub login_form: LoginForm,
    pub register_form: RegisterForm,
    pub challenge_form: ChallengeForm,
    pub progress_form: ProgressForm,
    pub ui: UiFlags,
    pub notice: Option<Notice>,
    /// Profile whose upsert has not succeeded yet; retried on refresh.
    pub pending_profile: Option<Account>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenAuthDialog(AuthMode),
    CloseAuthDialog,
    SwitchAuthMode(AuthMode),
    TogglePasswordVisibility,
    OpenCreateDialog,
    CloseCreateDialog,
    SelectTab(DashboardTab),
    SetExploreFilter(Option<AgeGroup>),
    EditLogin(LoginForm),
    EditRegister(RegisterForm),
    EditChallenge(ChallengeForm),
    EditProgress(ProgressForm),
    CarouselNext,
    CarouselPrev,
    CarouselSelect(usize),
    CarouselTick,
    RequestStarted,
    RequestFinished,
    Authenticated(Identity),
    SignedOut,
    NavigatedHome,
    ChallengesLoaded(Vec<Challenge>),
    ProgressLoaded(Vec<ProgressEntry>),
    WarningsLoaded(Vec<HealthWarning>),
    AccountLoaded(Option<Account>),
    ProfilePending(Account),
    ProfileSaved,
    ChallengeCreated,
    ProgressLogged(ProgressEntry),
    Notify(Notice),
    DismissNotice,
    /// Restore a pre-action snapshot after a failed call.
    Rollback(Box<AppState>),
}

impl AppState {
    pub fn session(&self) -> SessionContext {
        match &self.identity {
            Some(identity) => SessionContext::signed_in(identity.clone()),
            None => SessionContext::anonymous(),
        }
    }

    pub fn my_challenges(&self) -> Vec<&Challenge> {
        match &self.identity {
            Some(identity) => progress::joined(&identity.uid, &self.challenges),
            None => Vec::new(),
        }
    }

    pub fn explore_challenges(&self) -> Vec<&Challenge> {
        match &self.identity {
            Some(identity) => {
                progress::explorable(&identity.uid, &self.challenges, self.ui.explore_age_filter)
            }
            None => self.challenges.iter().collect(),
        }
    }

    pub fn progress_for(&self, challenge: &Challenge) -> Option<ChallengeProgress> {
        let identity = self.identity.as_ref()?;
        Some(progress::challenge_progress(&identity.uid, challenge, &self.progress))
    }

    pub fn stats(&self, now: DateTime<Utc>) -> DashboardStats {
        match &self.identity {
            Some(identity) => {
                progress::dashboard_stats(&identity.uid, &self.challenges, &self.progress, now)
            }
            None => DashboardStats::default(),
        }
    }

    /// Account shown in the header: the loaded profile, else the pending one.
    pub fn profile(&self) -> Option<&Account> {
        self.account.as_ref().or(self.pending_profile.as_ref())
    }
}

/// Back to an anonymous landing page. Carousel position and notice survive.
fn to_landing(state: AppState) -> AppState {
    AppState {
        ui: UiFlags {
            carousel_index: state.ui.carousel_index,
            loading: state.ui.loading,
            ..UiFlags::default()
        },
        notice: state.notice,
        ..AppState::default()
    }
}

pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::OpenAuthDialog(mode) => {
            state.ui.auth_dialog_open = true;
            state.ui.auth_mode = mode;
        }
        Action::CloseAuthDialog => {
            state.ui.auth_dialog_open = false;
            state.ui.show_password = false;
        }
        Action::SwitchAuthMode(mode) => state.ui.auth_mode = mode,
        Action::TogglePasswordVisibility => state.ui.show_password = !state.ui.show_password,
        Action::OpenCreateDialog => state.ui.create_dialog_open = true,
        Action::CloseCreateDialog => state.ui.create_dialog_open = false,
        Action::SelectTab(tab) => state.ui.active_tab = tab,
        Action::SetExploreFilter(filter) => state.ui.explore_age_filter = filter,
        Action::EditLogin(form) => state.login_form = form,
        Action::EditRegister(form) => state.register_form = form,
        Action::EditChallenge(form) => state.challenge_form = form,
        Action::EditProgress(form) => state.progress_form = form,
        Action::CarouselNext | Action::CarouselTick => {
            state.ui.carousel_index = carousel::next(state.ui.carousel_index)
        }
        Action::CarouselPrev => state.ui.carousel_index = carousel::prev(state.ui.carousel_index),
        Action::CarouselSelect(i) => state.ui.carousel_index = carousel::select(i),
        Action::RequestStarted => state.ui.loading = true,
        Action::RequestFinished => state.ui.loading = false,
        Action::Authenticated(identity) => {
            state.view = View::Dashboard;
            state.identity = Some(identity);
            state.login_form = LoginForm::default();
            state.register_form = RegisterForm::default();
            state.ui.auth_dialog_open = false;
            state.ui.show_password = false;
            state.ui.active_tab = DashboardTab::Overview;
        }
        Action::SignedOut | Action::NavigatedHome => return to_landing(state),
        Action::ChallengesLoaded(challenges) => state.challenges = challenges,
        Action::ProgressLoaded(entries) => state.progress = entries,
        Action::WarningsLoaded(warnings) => state.warnings = warnings,
        Action::AccountLoaded(account) => state.account = account,
        Action::ProfilePending(account) => state.pending_profile = Some(account),
        Action::ProfileSaved => {
            if let Some(account) = state.pending_profile.take() {
                state.account = Some(account);
            }
        }
        Action::ChallengeCreated => state.ui.create_dialog_open = false,
        Action::ProgressLogged(entry) => {
            state.progress.push(entry);
            state.progress_form = ProgressForm::default();
        }
        Action::Notify(notice) => state.notice = Some(notice),
        Action::DismissNotice => state.notice = None,
        Action::Rollback(snapshot) => {
            let carousel_index = state.ui.carousel_index;
            state = *snapshot;
            state.ui.carousel_index = carousel_index;
            state.ui.loading = false;
        }
    }
    state
}
