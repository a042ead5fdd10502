use anyhow::Context;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::Arc};
use uuid::Uuid;

use crate::{
    config::{Config, IdentityConfig},
    error::truncate_body,
    model::User,
};

use super::{AuthError, AuthErrorCode, ConsentPrompt, IdentityProvider};

const SIGN_IN_WITH_IDP: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithIdp";
const GOOGLE_CONSENT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google sign-in through the Firebase Auth REST API.
#[derive(Debug, Clone)]
pub struct FirebaseIdentity {
    api_key: String,
    client_id: String,
    redirect_uri: String,
    endpoint: String,
    http: Client,
    prompt: Arc<dyn ConsentPrompt>,
    session_file: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    user: User,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorBody {
    error: FirebaseErrorDetail,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorDetail {
    message: String,
}

fn code_for(message: &str) -> AuthErrorCode {
    if message.starts_with("USER_DISABLED") {
        AuthErrorCode::UserDisabled
    } else if message.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") {
        AuthErrorCode::TooManyRequests
    } else {
        AuthErrorCode::Unknown
    }
}

/// Pull the Google ID token out of what the user pasted back: either a
/// redirect URL (`#id_token=...` or `?id_token=...`) or the bare token.
pub fn extract_id_token(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let Ok(url) = Url::parse(input) else {
        return (!input.contains(char::is_whitespace)).then(|| input.to_string());
    };

    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == "id_token")
        .map(|(_, value)| value.into_owned());

    from_query.or_else(|| {
        // Fragments use the same key=value encoding as queries.
        let mut probe = Url::parse("http://localhost/").ok()?;
        probe.set_query(url.fragment());
        probe
            .query_pairs()
            .find(|(key, _)| key == "id_token")
            .map(|(_, value)| value.into_owned())
    })
}

impl FirebaseIdentity {
    pub fn new(identity: &IdentityConfig, prompt: Arc<dyn ConsentPrompt>) -> Self {
        Self {
            api_key: identity.api_key.clone(),
            client_id: identity.google_client_id.clone(),
            redirect_uri: identity.redirect_uri().to_string(),
            endpoint: SIGN_IN_WITH_IDP.to_string(),
            http: Client::new(),
            prompt,
            session_file: None,
        }
    }

    pub fn from_config(config: &Config, prompt: Arc<dyn ConsentPrompt>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            session_file: Some(Config::session_file_path()?),
            ..Self::new(config.identity()?, prompt)
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_session_file(mut self, path: Option<PathBuf>) -> Self {
        self.session_file = path;
        self
    }

    /// Google consent page returning an ID token to the redirect URI.
    pub fn consent_url(&self, nonce: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            GOOGLE_CONSENT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "id_token"),
                ("scope", "openid email profile"),
                ("nonce", nonce),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::new(AuthErrorCode::Unknown, format!("bad consent URL: {e}")))
    }

    async fn exchange(&self, id_token: &str) -> Result<SignInWithIdpResponse, AuthError> {
        let request = SignInWithIdpRequest {
            post_body: format!("id_token={id_token}&providerId=google.com"),
            request_uri: &self.redirect_uri,
            return_idp_credential: true,
            return_secure_token: true,
        };

        let res = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::new(AuthErrorCode::NetworkRequestFailed, e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| AuthError::new(AuthErrorCode::NetworkRequestFailed, e.to_string()))?;

        if !status.is_success() {
            let code = serde_json::from_str::<FirebaseErrorBody>(&body)
                .map(|b| code_for(&b.error.message))
                .unwrap_or(AuthErrorCode::Unknown);

            return Err(AuthError::new(
                code,
                format!("signInWithIdp failed with status {status}: {}", truncate_body(&body)),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            AuthError::new(
                AuthErrorCode::Unknown,
                format!("failed to parse signInWithIdp response: {e}"),
            )
        })
    }

    fn load_session(&self) -> Option<StoredSession> {
        let path = self.session_file.as_ref()?;
        if !path.exists() {
            return None;
        }

        let parsed = fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str(&s).map_err(anyhow::Error::from));

        match parsed {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("ignoring unreadable session file {}: {err:#}", path.display());
                None
            }
        }
    }

    fn store_session(&self, session: &StoredSession) -> anyhow::Result<()> {
        let Some(path) = &self.session_file else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write session file: {}", path.display()))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn restore(&self) -> Option<User> {
        self.load_session().map(|s| s.user)
    }

    async fn sign_in_with_google(&self) -> Result<User, AuthError> {
        let nonce = Uuid::new_v4().simple().to_string();
        let consent_url = self.consent_url(&nonce)?;

        let answer = self.prompt.request_consent(&consent_url).await?;
        let id_token = extract_id_token(&answer).ok_or_else(|| {
            AuthError::new(
                AuthErrorCode::PopupClosedByUser,
                "no ID token came back from the consent page",
            )
        })?;

        let res = self.exchange(&id_token).await?;
        debug!("signInWithIdp accepted user {}", res.local_id);

        let user = User {
            uid: res.local_id,
            email: res.email,
            display_name: res.display_name,
            photo_url: res.photo_url,
        };

        let stored = StoredSession {
            user: user.clone(),
            refresh_token: res.refresh_token,
        };
        if let Err(err) = self.store_session(&stored) {
            warn!("session will not survive a restart: {err:#}");
        }

        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(path) = &self.session_file else {
            return Ok(());
        };

        if path.exists() {
            fs::remove_file(path).map_err(|e| {
                AuthError::new(
                    AuthErrorCode::SignOutFailed,
                    format!("failed to remove {}: {e}", path.display()),
                )
            })?;
        }

        Ok(())
    }
}
