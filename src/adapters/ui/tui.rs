//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Each loop iteration drains carousel ticks, renders the current state, then asks for one
//! action and hands it to the controller. Calls run under a spinner.

use crate::adapters::ui::render;
use crate::adapters::ui::ticker::CarouselTicker;
use crate::app::carousel;
use crate::app::state::{
    Action, AuthMode, ChallengeForm, DashboardTab, LoginForm, ProgressForm, RegisterForm, View,
};
use crate::app::{AppController, Notice};
use crate::domain::{AgeGroup, ChallengeId, Difficulty, DomainError, FitnessLevel, GoalType};
use crate::ports::InputPort;
use async_trait::async_trait;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{InquireError, MultiSelect, Password, PasswordDisplayMode, Select, Text};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Applies the prompt theme for all subsequent inquire prompts.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(Color::LightGreen))
        .with_answered_prompt_prefix(Styled::new("✔").with_fg(Color::LightGreen))
        .with_highlighted_option_prefix(Styled::new("➜").with_fg(Color::LightCyan))
        .with_selected_checkbox(Styled::new("[x]").with_fg(Color::LightGreen));
    inquire::set_global_render_config(config);
}

enum Flow {
    Continue,
    Quit,
}

/// `None` when the user pressed Esc; Ctrl-C and terminal failures become errors.
fn ask<T>(result: Result<T, InquireError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(InquireError::OperationInterrupted) => Err(DomainError::Input("interrupted".into())),
        Err(e) => Err(DomainError::Input(e.to_string())),
    }
}

async fn with_spinner<F: Future>(message: &str, call: F) -> F::Output {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let out = call.await;
    pb.finish_and_clear();
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LandingChoice {
    NextSlide,
    PrevSlide,
    JumpToSlide,
    LogIn,
    SignUp,
    Quit,
}

impl fmt::Display for LandingChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LandingChoice::NextSlide => "Next slide",
            LandingChoice::PrevSlide => "Previous slide",
            LandingChoice::JumpToSlide => "Jump to slide",
            LandingChoice::LogIn => "Log in",
            LandingChoice::SignUp => "Get started (sign up)",
            LandingChoice::Quit => "Quit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthChoice {
    Submit,
    Switch,
    TogglePassword,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DashboardChoice {
    NextTab,
    SwitchTab,
    Refresh,
    CreateChallenge,
    JoinChallenge,
    LogProgress,
    FilterByAge,
    Leaderboard,
    Home,
    LogOut,
    Quit,
}

impl fmt::Display for DashboardChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DashboardChoice::NextTab => "Next tab",
            DashboardChoice::SwitchTab => "Switch tab",
            DashboardChoice::Refresh => "Refresh",
            DashboardChoice::CreateChallenge => "Create challenge",
            DashboardChoice::JoinChallenge => "Join challenge",
            DashboardChoice::LogProgress => "Log progress",
            DashboardChoice::FilterByAge => "Filter explore by age group",
            DashboardChoice::Leaderboard => "View leaderboard",
            DashboardChoice::Home => "Home",
            DashboardChoice::LogOut => "Log out",
            DashboardChoice::Quit => "Quit",
        })
    }
}

/// Menu for the active tab. Tab-specific actions come first.
fn dashboard_menu(tab: DashboardTab) -> Vec<DashboardChoice> {
    use DashboardChoice::*;
    let mut menu = match tab {
        DashboardTab::Overview | DashboardTab::HealthAlerts => vec![],
        DashboardTab::MyChallenges => vec![Leaderboard],
        DashboardTab::LogProgress => vec![LogProgress],
        DashboardTab::Explore => vec![JoinChallenge, CreateChallenge, FilterByAge, Leaderboard],
    };
    menu.extend([NextTab, SwitchTab, Refresh, Home, LogOut, Quit]);
    menu
}

/// Select option carrying a challenge id.
struct ChallengeChoice {
    id: ChallengeId,
    label: String,
}

impl fmt::Display for ChallengeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Select option for the explore filter.
struct AgeFilter(Option<AgeGroup>);

impl fmt::Display for AgeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(age) => write!(f, "{}", age),
            None => f.write_str("All ages"),
        }
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    controller: Mutex<AppController>,
    carousel_period: Duration,
}

impl TuiInputPort {
    pub fn new(controller: AppController, carousel_period: Duration) -> Self {
        Self {
            controller: Mutex::new(controller),
            carousel_period,
        }
    }

    /// Apply pending carousel ticks, print the screen, then drop the shown notice.
    fn show(app: &mut AppController, ticker: &mut CarouselTicker) {
        for _ in 0..ticker.drain() {
            app.dispatch(Action::CarouselTick);
        }
        render::print(&render::render(app.state(), Utc::now()));
        if app.state().notice.is_some() {
            app.dispatch(Action::DismissNotice);
        }
    }

    async fn landing(app: &mut AppController, ticker: &mut CarouselTicker) -> Result<Flow, DomainError> {
        let options = vec![
            LandingChoice::NextSlide,
            LandingChoice::PrevSlide,
            LandingChoice::JumpToSlide,
            LandingChoice::LogIn,
            LandingChoice::SignUp,
            LandingChoice::Quit,
        ];
        let Some(choice) = ask(Select::new("What next?", options).prompt())? else {
            return Ok(Flow::Continue);
        };
        match choice {
            LandingChoice::NextSlide => app.dispatch(Action::CarouselNext),
            LandingChoice::PrevSlide => app.dispatch(Action::CarouselPrev),
            LandingChoice::JumpToSlide => {
                let titles: Vec<&str> = carousel::SLIDES.iter().map(|s| s.title).collect();
                let picked = ask(Select::new("Slide", titles)
                    .with_starting_cursor(carousel::select(app.state().ui.carousel_index))
                    .raw_prompt())?;
                if let Some(option) = picked {
                    app.dispatch(Action::CarouselSelect(option.index));
                }
            }
            LandingChoice::LogIn => Self::auth_dialog(app, ticker, AuthMode::Login).await?,
            LandingChoice::SignUp => Self::auth_dialog(app, ticker, AuthMode::Register).await?,
            LandingChoice::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn auth_dialog(
        app: &mut AppController,
        ticker: &mut CarouselTicker,
        mode: AuthMode,
    ) -> Result<(), DomainError> {
        app.dispatch(Action::OpenAuthDialog(mode));
        while app.state().ui.auth_dialog_open && app.state().view == View::Landing {
            Self::show(app, ticker);
            let mode = app.state().ui.auth_mode;
            let (submit, switch) = match mode {
                AuthMode::Login => ("Log in", "Need an account? Sign up"),
                AuthMode::Register => ("Create account", "Have an account? Log in"),
            };
            let reveal = if app.state().ui.show_password {
                "Hide password"
            } else {
                "Show password"
            };
            let options = vec![submit, switch, reveal, "Close"];
            let picked = ask(Select::new("Account", options).raw_prompt())?;
            let choice = match picked.map(|o| o.index) {
                Some(0) => AuthChoice::Submit,
                Some(1) => AuthChoice::Switch,
                Some(2) => AuthChoice::TogglePassword,
                _ => AuthChoice::Close,
            };
            match choice {
                AuthChoice::Submit => match mode {
                    AuthMode::Login => {
                        if let Some(form) = Self::fill_login(app)? {
                            app.dispatch(Action::EditLogin(form));
                            with_spinner("Signing in...", app.login()).await;
                        }
                    }
                    AuthMode::Register => {
                        if let Some(form) = Self::fill_register(app)? {
                            app.dispatch(Action::EditRegister(form));
                            with_spinner("Creating account...", app.register()).await;
                        }
                    }
                },
                AuthChoice::Switch => app.dispatch(Action::SwitchAuthMode(match mode {
                    AuthMode::Login => AuthMode::Register,
                    AuthMode::Register => AuthMode::Login,
                })),
                AuthChoice::TogglePassword => app.dispatch(Action::TogglePasswordVisibility),
                AuthChoice::Close => app.dispatch(Action::CloseAuthDialog),
            }
        }
        Ok(())
    }

    fn password_mode(app: &AppController) -> PasswordDisplayMode {
        if app.state().ui.show_password {
            PasswordDisplayMode::Full
        } else {
            PasswordDisplayMode::Masked
        }
    }

    fn fill_login(app: &AppController) -> Result<Option<LoginForm>, DomainError> {
        let current = app.state().login_form.clone();
        let Some(email) = ask(Text::new("Email:").with_initial_value(&current.email).prompt())? else {
            return Ok(None);
        };
        let Some(password) = ask(Password::new("Password:")
            .with_display_mode(Self::password_mode(app))
            .without_confirmation()
            .prompt())?
        else {
            return Ok(None);
        };
        Ok(Some(LoginForm { email, password }))
    }

    fn fill_register(app: &AppController) -> Result<Option<RegisterForm>, DomainError> {
        let current = app.state().register_form.clone();
        let Some(full_name) =
            ask(Text::new("Full name:").with_initial_value(&current.full_name).prompt())?
        else {
            return Ok(None);
        };
        let Some(email) = ask(Text::new("Email:").with_initial_value(&current.email).prompt())? else {
            return Ok(None);
        };
        let Some(password) = ask(Password::new("Password:")
            .with_display_mode(Self::password_mode(app))
            .without_confirmation()
            .prompt())?
        else {
            return Ok(None);
        };
        let Some(age_group) = ask(Select::new("Age group:", AgeGroup::ALL.to_vec()).prompt())? else {
            return Ok(None);
        };
        let Some(fitness_level) =
            ask(Select::new("Fitness level:", FitnessLevel::ALL.to_vec()).prompt())?
        else {
            return Ok(None);
        };
        Ok(Some(RegisterForm {
            email,
            password,
            full_name,
            age_group: Some(age_group),
            fitness_level: Some(fitness_level),
        }))
    }

    fn fill_challenge(app: &AppController) -> Result<Option<ChallengeForm>, DomainError> {
        let current = app.state().challenge_form.clone();
        let Some(name) = ask(Text::new("Name:").with_initial_value(&current.name).prompt())? else {
            return Ok(None);
        };
        let Some(description) =
            ask(Text::new("Description:").with_initial_value(&current.description).prompt())?
        else {
            return Ok(None);
        };
        let goal_cursor = GoalType::ALL
            .iter()
            .position(|g| *g == current.goal_type)
            .unwrap_or(0);
        let Some(goal_type) = ask(Select::new("Goal type:", GoalType::ALL.to_vec())
            .with_starting_cursor(goal_cursor)
            .prompt())?
        else {
            return Ok(None);
        };
        let Some(target_value) =
            ask(Text::new("Target value:").with_initial_value(&current.target_value).prompt())?
        else {
            return Ok(None);
        };
        let Some(duration_days) = ask(Text::new("Duration (days):")
            .with_initial_value(&current.duration_days)
            .prompt())?
        else {
            return Ok(None);
        };
        let defaults: Vec<usize> = AgeGroup::ALL
            .iter()
            .enumerate()
            .filter(|(_, a)| current.age_groups.contains(a))
            .map(|(i, _)| i)
            .collect();
        let Some(age_groups) = ask(MultiSelect::new(
            "Age groups (none selected means open to all):",
            AgeGroup::ALL.to_vec(),
        )
        .with_default(&defaults)
        .prompt())?
        else {
            return Ok(None);
        };
        let difficulty_cursor = Difficulty::ALL
            .iter()
            .position(|d| *d == current.difficulty_level)
            .unwrap_or(1);
        let Some(difficulty_level) = ask(Select::new("Difficulty:", Difficulty::ALL.to_vec())
            .with_starting_cursor(difficulty_cursor)
            .prompt())?
        else {
            return Ok(None);
        };
        Ok(Some(ChallengeForm {
            name,
            description,
            goal_type,
            target_value,
            duration_days,
            age_groups,
            difficulty_level,
        }))
    }

    fn pick_challenge(
        app: &AppController,
        prompt: &str,
        joined_only: bool,
    ) -> Result<Option<ChallengeId>, DomainError> {
        let state = app.state();
        let candidates = if joined_only {
            state.my_challenges()
        } else {
            state.challenges.iter().collect()
        };
        let options: Vec<ChallengeChoice> = candidates
            .iter()
            .map(|c| ChallengeChoice {
                id: c.id.clone(),
                label: format!("{} ({} {}, {} joined)", c.name, c.target_value, c.goal_type, c.participants_count()),
            })
            .collect();
        if options.is_empty() {
            return Ok(None);
        }
        Ok(ask(Select::new(prompt, options).prompt())?.map(|c| c.id))
    }

    async fn dashboard(app: &mut AppController, ticker: &mut CarouselTicker) -> Result<Flow, DomainError> {
        let menu = dashboard_menu(app.state().ui.active_tab);
        let Some(choice) = ask(Select::new("What next?", menu).prompt())? else {
            return Ok(Flow::Continue);
        };
        match choice {
            DashboardChoice::NextTab => {
                let next = app.state().ui.active_tab.next();
                app.dispatch(Action::SelectTab(next));
            }
            DashboardChoice::SwitchTab => {
                if let Some(tab) = ask(Select::new("Tab", DashboardTab::ALL.to_vec()).prompt())? {
                    app.dispatch(Action::SelectTab(tab));
                }
            }
            DashboardChoice::Refresh => with_spinner("Refreshing...", app.refresh()).await,
            DashboardChoice::CreateChallenge => {
                app.dispatch(Action::OpenCreateDialog);
                Self::show(app, ticker);
                if let Some(form) = Self::fill_challenge(app)? {
                    app.dispatch(Action::EditChallenge(form));
                    with_spinner("Creating challenge...", app.create_challenge()).await;
                }
                app.dispatch(Action::CloseCreateDialog);
            }
            DashboardChoice::JoinChallenge => {
                match Self::pick_challenge(app, "Join which challenge?", false)? {
                    Some(id) => with_spinner("Joining...", app.join_challenge(&id)).await,
                    None if app.state().challenges.is_empty() => {
                        app.dispatch(Action::Notify(Notice::info("No challenges yet. Create the first one!")))
                    }
                    None => {}
                }
            }
            DashboardChoice::LogProgress => {
                if app.state().my_challenges().is_empty() {
                    app.dispatch(Action::Notify(Notice::info("Join a challenge before logging progress.")));
                    return Ok(Flow::Continue);
                }
                let Some(id) = Self::pick_challenge(app, "Challenge:", true)? else {
                    return Ok(Flow::Continue);
                };
                let current = app.state().progress_form.clone();
                let Some(value) = ask(Text::new("Value:").with_initial_value(&current.value).prompt())? else {
                    return Ok(Flow::Continue);
                };
                let Some(notes) = ask(Text::new("Notes (optional):")
                    .with_initial_value(&current.notes)
                    .prompt())?
                else {
                    return Ok(Flow::Continue);
                };
                app.dispatch(Action::EditProgress(ProgressForm {
                    challenge_id: Some(id),
                    value,
                    notes,
                }));
                with_spinner("Logging progress...", app.log_progress()).await;
            }
            DashboardChoice::FilterByAge => {
                let options: Vec<AgeFilter> = std::iter::once(AgeFilter(None))
                    .chain(AgeGroup::ALL.iter().map(|a| AgeFilter(Some(*a))))
                    .collect();
                if let Some(AgeFilter(filter)) = ask(Select::new("Show challenges for:", options).prompt())? {
                    app.dispatch(Action::SetExploreFilter(filter));
                }
            }
            DashboardChoice::Leaderboard => {
                let Some(id) = Self::pick_challenge(app, "Leaderboard for:", false)? else {
                    return Ok(Flow::Continue);
                };
                let rows = with_spinner("Loading leaderboard...", app.leaderboard(&id)).await;
                let challenge = app.state().challenges.iter().find(|c| c.id == id).cloned();
                if let (Some(rows), Some(challenge)) = (rows, challenge) {
                    render::print(&render::leaderboard_screen(&challenge, &rows));
                    ask(Text::new("Press Enter to return").prompt())?;
                }
            }
            DashboardChoice::Home => app.navigate_home(),
            DashboardChoice::LogOut => with_spinner("Signing out...", app.logout()).await,
            DashboardChoice::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut app = self.controller.lock().await;
        with_spinner("Restoring session...", app.start()).await;
        let mut ticker = CarouselTicker::start(self.carousel_period);
        loop {
            Self::show(&mut app, &mut ticker);
            let step = match app.state().view {
                View::Landing => Self::landing(&mut app, &mut ticker).await,
                View::Dashboard => Self::dashboard(&mut app, &mut ticker).await,
            };
            match step {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(DomainError::Input(reason)) if reason == "interrupted" => break,
                Err(e) => return Err(e),
            }
        }
        info!("bye");
        Ok(())
    }
}
