//! Application state machine: landing and dashboard views, driven by actions.

pub mod bootstrap;
pub mod carousel;
pub mod controller;
pub mod state;

pub use controller::{AppController, Services};
pub use state::{Action, AppState, AuthMode, DashboardTab, Notice, NoticeKind, View, reduce};
