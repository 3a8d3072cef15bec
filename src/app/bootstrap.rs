//! Startup view selection.

use crate::app::state::{Action, AppState, Notice, reduce};
use crate::usecases::AuthService;
use tracing::{info, warn};

/// Dashboard when the identity provider already holds a session, landing otherwise.
/// Only the identity is restored; profile fields are not fetched here.
pub async fn initial_state(auth: &AuthService) -> AppState {
    match auth.current_identity().await {
        Ok(Some(identity)) => {
            info!(uid = %identity.uid, "resuming existing session");
            reduce(AppState::default(), Action::Authenticated(identity))
        }
        Ok(None) => AppState::default(),
        Err(e) => {
            warn!(error = %e, "could not read existing session");
            reduce(
                AppState::default(),
                Action::Notify(Notice::warning(format!("Could not restore session: {}", e))),
            )
        }
    }
}
