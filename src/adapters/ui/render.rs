//! Pure view renderer: application state in, screen tree out.
//!
//! Nothing here touches the network or the store. `print` is the only function with I/O.

use crate::app::carousel;
use crate::app::state::{AppState, AuthMode, DashboardTab, NoticeKind, View};
use crate::domain::guidelines;
use crate::domain::progress::LeaderboardRow;
use crate::domain::{Challenge, Severity};
use crate::usecases::warning_service::risks_for;
use chrono::{DateTime, Utc};
use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::{Write, stdout};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    Muted,
    Accent,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub tone: Tone,
    pub text: String,
}

impl Line {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self { tone, text: text.into() }
    }

    fn plain(text: impl Into<String>) -> Self {
        Self::new(Tone::Plain, text)
    }

    fn muted(text: impl Into<String>) -> Self {
        Self::new(Tone::Muted, text)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub title: String,
    pub lines: Vec<Line>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), lines: Vec::new() }
    }

    fn push(&mut self, line: Line) {
        self.lines.push(line);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screen {
    pub header: String,
    pub sections: Vec<Section>,
    pub footer: Vec<Line>,
}

impl Screen {
    /// All rendered text, one line per entry. Handy for assertions and logs.
    pub fn text(&self) -> String {
        let mut out = vec![self.header.clone()];
        for section in &self.sections {
            out.push(section.title.clone());
            out.extend(section.lines.iter().map(|l| l.text.clone()));
        }
        out.extend(self.footer.iter().map(|l| l.text.clone()));
        out.join("\n")
    }
}

/// `[########............]  40%`
pub fn progress_bar(percent: f64) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

fn challenge_summary(challenge: &Challenge) -> String {
    format!(
        "{} | {} {} over {} days | {} | {} joined",
        challenge.name,
        challenge.target_value,
        challenge.goal_type,
        challenge.duration_days,
        challenge.difficulty_level,
        challenge.participants_count()
    )
}

fn age_groups_label(challenge: &Challenge) -> String {
    if challenge.age_groups.is_empty() {
        "all ages".to_string()
    } else {
        challenge
            .age_groups
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn render(state: &AppState, now: DateTime<Utc>) -> Screen {
    let mut screen = match state.view {
        View::Landing => render_landing(state),
        View::Dashboard => render_dashboard(state, now),
    };
    if state.ui.loading {
        screen.footer.push(Line::muted("Loading..."));
    }
    if let Some(notice) = &state.notice {
        let tone = match notice.kind {
            NoticeKind::Info => Tone::Accent,
            NoticeKind::Success => Tone::Success,
            NoticeKind::Warning => Tone::Warning,
            NoticeKind::Error => Tone::Error,
        };
        screen.footer.push(Line::new(tone, notice.message.clone()));
    }
    screen
}

fn render_landing(state: &AppState) -> Screen {
    let mut sections = Vec::new();

    let slide = carousel::slide(state.ui.carousel_index);
    let mut hero = Section::new(format!(
        "{} ({}/{})",
        slide.title,
        carousel::select(state.ui.carousel_index) + 1,
        carousel::SLIDES.len()
    ));
    hero.push(Line::new(Tone::Accent, slide.subtitle));
    hero.push(Line::muted(slide.audience));
    hero.push(Line::plain(slide.activities.join(" | ")));
    sections.push(hero);

    let mut about = Section::new("Fitness for every generation");
    about.push(Line::plain("Join challenges, track progress and stay safe with age-specific guidance."));
    sections.push(about);

    if state.ui.auth_dialog_open {
        let mut dialog = Section::new(match state.ui.auth_mode {
            AuthMode::Login => "Log in",
            AuthMode::Register => "Create your account",
        });
        let (email, password) = match state.ui.auth_mode {
            AuthMode::Login => (&state.login_form.email, &state.login_form.password),
            AuthMode::Register => (&state.register_form.email, &state.register_form.password),
        };
        dialog.push(Line::plain(format!("Email: {}", email)));
        let shown = if state.ui.show_password {
            password.clone()
        } else {
            "*".repeat(password.chars().count())
        };
        dialog.push(Line::plain(format!("Password: {}", shown)));
        if state.ui.auth_mode == AuthMode::Register {
            let form = &state.register_form;
            dialog.push(Line::plain(format!("Full name: {}", form.full_name)));
            dialog.push(Line::plain(format!(
                "Age group: {}",
                form.age_group.map(|a| a.as_str()).unwrap_or("-")
            )));
            dialog.push(Line::plain(format!(
                "Fitness level: {}",
                form.fitness_level.map(|f| f.as_str()).unwrap_or("-")
            )));
        }
        sections.push(dialog);
    }

    Screen {
        header: "FitTogether".to_string(),
        sections,
        footer: Vec::new(),
    }
}

fn render_dashboard(state: &AppState, now: DateTime<Utc>) -> Screen {
    let header = match state.profile() {
        Some(account) => format!("FitTogether | Welcome, {}", account.full_name),
        None => match &state.identity {
            Some(identity) => format!("FitTogether | {}", identity.email),
            None => "FitTogether".to_string(),
        },
    };

    let tabs = DashboardTab::ALL
        .iter()
        .map(|t| {
            if *t == state.ui.active_tab {
                format!("[{}]", t.title())
            } else {
                t.title().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let mut nav = Section::new("Dashboard");
    nav.push(Line::new(Tone::Heading, tabs));

    let mut sections = vec![nav];
    sections.extend(match state.ui.active_tab {
        DashboardTab::Overview => overview(state, now),
        DashboardTab::MyChallenges => my_challenges(state),
        DashboardTab::LogProgress => log_progress(state),
        DashboardTab::Explore => explore(state),
        DashboardTab::HealthAlerts => health_alerts(state),
    });

    if state.ui.create_dialog_open {
        let form = &state.challenge_form;
        let mut dialog = Section::new("Create challenge");
        dialog.push(Line::plain(format!("Name: {}", form.name)));
        dialog.push(Line::plain(format!("Description: {}", form.description)));
        dialog.push(Line::plain(format!("Goal type: {}", form.goal_type)));
        dialog.push(Line::plain(format!("Target value: {}", form.target_value)));
        dialog.push(Line::plain(format!("Duration (days): {}", form.duration_days)));
        dialog.push(Line::plain(format!("Difficulty: {}", form.difficulty_level)));
        sections.push(dialog);
    }

    Screen {
        header,
        sections,
        footer: Vec::new(),
    }
}

fn overview(state: &AppState, now: DateTime<Utc>) -> Vec<Section> {
    let stats = state.stats(now);
    let mut summary = Section::new("Your progress");
    summary.push(Line::plain(format!("Total challenges: {}", stats.total_challenges)));
    summary.push(Line::plain(format!("Active: {}", stats.active_challenges)));
    summary.push(Line::plain(format!("Completed: {}", stats.completed_challenges)));
    summary.push(Line::plain(format!("Completion rate: {:.0}%", stats.completion_rate)));

    let mut guide = Section::new("Exercise guidelines");
    match state.profile() {
        Some(account) => {
            let g = guidelines::for_age_group(account.age_group);
            guide.push(Line::new(Tone::Accent, format!("{} ({})", account.age_group, g.age_range)));
            guide.push(Line::plain(format!("Aerobic: {}", g.aerobic)));
            guide.push(Line::plain(format!("Strength: {}", g.strength_frequency)));
            if let Some(balance) = g.balance_frequency {
                guide.push(Line::plain(format!("Balance: {}", balance)));
            }
            guide.push(Line::muted(g.activities.join(" | ")));
        }
        None => guide.push(Line::muted("Refresh to load your profile and personalised guidance.")),
    }

    let mut recent = Section::new("Recent activity");
    if state.progress.is_empty() {
        recent.push(Line::muted("No progress logged yet."));
    }
    for entry in state.progress.iter().rev().take(5) {
        let name = state
            .challenges
            .iter()
            .find(|c| c.id == entry.challenge_id)
            .map(|c| c.name.as_str())
            .unwrap_or(entry.challenge_id.as_str());
        recent.push(Line::plain(format!(
            "{}  {}: {}{}",
            entry.logged_at.format("%Y-%m-%d"),
            name,
            entry.value,
            entry.notes.as_deref().map(|n| format!(" ({})", n)).unwrap_or_default()
        )));
    }
    vec![summary, guide, recent]
}

fn my_challenges(state: &AppState) -> Vec<Section> {
    let mut section = Section::new("My challenges");
    let mine = state.my_challenges();
    if mine.is_empty() {
        section.push(Line::muted("You have not joined any challenges yet. Try the Explore tab."));
    }
    for challenge in mine {
        section.push(Line::new(Tone::Heading, challenge_summary(challenge)));
        if let Some(p) = state.progress_for(challenge) {
            let tone = if p.is_complete() { Tone::Success } else { Tone::Plain };
            section.push(Line::new(
                tone,
                format!("{} {} / {}", progress_bar(p.percent), p.total, challenge.target_value),
            ));
        }
    }
    vec![section]
}

fn log_progress(state: &AppState) -> Vec<Section> {
    let mut section = Section::new("Log progress");
    let form = &state.progress_form;
    let selected = form
        .challenge_id
        .as_ref()
        .and_then(|id| state.challenges.iter().find(|c| &c.id == id))
        .map(|c| c.name.as_str())
        .unwrap_or("-");
    section.push(Line::plain(format!("Challenge: {}", selected)));
    section.push(Line::plain(format!("Value: {}", form.value)));
    section.push(Line::plain(format!("Notes: {}", form.notes)));
    if state.my_challenges().is_empty() {
        section.push(Line::muted("Join a challenge before logging progress."));
    }
    vec![section]
}

fn explore(state: &AppState) -> Vec<Section> {
    let title = match state.ui.explore_age_filter {
        Some(age) => format!("Explore challenges ({})", age),
        None => "Explore challenges".to_string(),
    };
    let mut section = Section::new(title);
    let open = state.explore_challenges();
    if open.is_empty() {
        section.push(Line::muted("No challenges to explore right now."));
    }
    let age = state.profile().map(|a| a.age_group);
    for challenge in open {
        section.push(Line::new(Tone::Heading, challenge_summary(challenge)));
        section.push(Line::plain(challenge.description.clone()));
        let eligible = age.is_none_or(|a| challenge.is_eligible(a));
        let label = format!("Ages: {}", age_groups_label(challenge));
        section.push(if eligible {
            Line::muted(label)
        } else {
            Line::new(Tone::Warning, format!("{} (outside your age group)", label))
        });
    }
    vec![section]
}

fn health_alerts(state: &AppState) -> Vec<Section> {
    let mut section = Section::new("Health alerts");
    if state.warnings.is_empty() {
        section.push(Line::muted("No health warnings at this time."));
    }
    let age = state.profile().map(|a| a.age_group);
    for warning in &state.warnings {
        let tone = match warning.severity {
            Severity::High => Tone::Error,
            Severity::Medium => Tone::Warning,
            Severity::Low => Tone::Accent,
        };
        section.push(Line::new(
            tone,
            format!("[{}] {}", warning.severity.to_string().to_uppercase(), warning.message),
        ));
        let risks: Vec<&str> = match age {
            Some(a) => risks_for(warning, a),
            None => warning.age_specific_risks.iter().map(String::as_str).collect(),
        };
        for risk in risks {
            section.push(Line::muted(format!("  - {}", risk)));
        }
    }
    vec![section]
}

pub fn leaderboard_screen(challenge: &Challenge, rows: &[LeaderboardRow]) -> Screen {
    let mut section = Section::new(format!("Leaderboard: {}", challenge.name));
    if rows.is_empty() {
        section.push(Line::muted("No participants yet."));
    }
    for row in rows {
        section.push(Line::plain(format!("{:>2}. {}  {}", row.rank, row.account, row.total)));
    }
    Screen {
        header: "FitTogether".to_string(),
        sections: vec![section],
        footer: Vec::new(),
    }
}

fn color(tone: Tone) -> Option<Color> {
    match tone {
        Tone::Plain => None,
        Tone::Heading => Some(Color::White),
        Tone::Muted => Some(Color::DarkGrey),
        Tone::Accent => Some(Color::Cyan),
        Tone::Success => Some(Color::Green),
        Tone::Warning => Some(Color::Yellow),
        Tone::Error => Some(Color::Red),
    }
}

fn print_line(out: &mut std::io::Stdout, line: &Line) {
    if let Some(c) = color(line.tone) {
        let _ = out.execute(SetForegroundColor(c));
    }
    let _ = out.execute(Print(&line.text));
    let _ = out.execute(ResetColor);
    let _ = out.execute(Print("\r\n"));
}

/// Clears the terminal and prints the screen.
pub fn print(screen: &Screen) {
    let mut out = stdout();
    let _ = out.execute(Clear(ClearType::All));
    let _ = out.execute(SetForegroundColor(Color::Green));
    let _ = out.execute(Print(format!("{}\r\n\r\n", screen.header)));
    let _ = out.execute(ResetColor);
    for section in &screen.sections {
        print_line(&mut out, &Line::new(Tone::Heading, format!("== {} ==", section.title)));
        for line in &section.lines {
            print_line(&mut out, line);
        }
        let _ = out.execute(Print("\r\n"));
    }
    for line in &screen.footer {
        print_line(&mut out, line);
    }
    let _ = out.flush();
}
