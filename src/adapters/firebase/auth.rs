//! Implements IdentityProvider against the Firebase Identity Toolkit REST API.
//!
//! The returned id token is kept on the Identity and persisted to the session file,
//! so Firestore calls can present it as a bearer credential.

use crate::adapters::persistence::session_file::SessionFile;
use crate::domain::{AuthFailure, DomainError, Identity};
use crate::ports::IdentityProvider;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map Identity Toolkit error codes onto the auth failure taxonomy.
/// Messages look like `WEAK_PASSWORD : Password should be at least 6 characters`.
pub(crate) fn map_error_code(message: &str) -> AuthFailure {
    let code = message.split(':').next().unwrap_or(message).trim();
    match code {
        "EMAIL_EXISTS" => AuthFailure::EmailTaken,
        "WEAK_PASSWORD" => AuthFailure::WeakPassword { min_len: 6 },
        "INVALID_EMAIL" => AuthFailure::InvalidEmail,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthFailure::InvalidCredentials
        }
        _ => AuthFailure::Provider(message.to_string()),
    }
}

pub struct FirebaseAuthAdapter {
    client: Client,
    api_key: String,
    session: SessionFile,
}

impl FirebaseAuthAdapter {
    /// # Arguments
    /// * `client` - shared HTTP client (timeouts configured by the caller)
    /// * `api_key` - Firebase web API key
    /// * `session` - where the signed-in identity is persisted between runs
    pub fn new(client: Client, api_key: String, session: SessionFile) -> Self {
        Self {
            client,
            api_key,
            session,
        }
    }

    async fn call(&self, endpoint: &str, email: &str, password: &str) -> Result<Identity, DomainError> {
        let url = format!("{}/accounts:{}?key={}", IDENTITY_TOOLKIT_URL, endpoint, self.api_key);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthFailure::Provider(format!("request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            debug!(%status, body = %text, endpoint, "identity toolkit error");
            let failure = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| map_error_code(&env.error.message))
                .unwrap_or_else(|_| AuthFailure::Provider(format!("HTTP {}: {}", status, text)));
            return Err(failure.into());
        }

        let auth: AuthResponse = res
            .json()
            .await
            .map_err(|e| AuthFailure::Provider(format!("bad response: {}", e)))?;
        let identity = Identity {
            uid: crate::domain::AccountId::new(auth.local_id),
            email: auth.email.unwrap_or_else(|| email.to_string()),
            id_token: Some(auth.id_token),
            refresh_token: auth.refresh_token,
        };
        self.session.save(&identity).await?;
        Ok(identity)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseAuthAdapter {
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        let identity = self.call("signUp", email, password).await?;
        info!(uid = %identity.uid, "firebase identity created");
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, DomainError> {
        self.call("signInWithPassword", email, password).await
    }

    /// Firebase id tokens are stateless; ending the session means forgetting them.
    async fn end_session(&self, _identity: &Identity) -> Result<(), DomainError> {
        self.session.clear().await
    }

    async fn current_identity(&self) -> Result<Option<Identity>, DomainError> {
        self.session.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_failures() {
        assert_eq!(map_error_code("EMAIL_EXISTS"), AuthFailure::EmailTaken);
        assert_eq!(
            map_error_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthFailure::WeakPassword { min_len: 6 }
        );
        assert_eq!(
            map_error_code("INVALID_LOGIN_CREDENTIALS"),
            AuthFailure::InvalidCredentials
        );
        assert_eq!(
            map_error_code("TOO_MANY_ATTEMPTS_TRY_LATER"),
            AuthFailure::Provider("TOO_MANY_ATTEMPTS_TRY_LATER".into())
        );
    }
}
