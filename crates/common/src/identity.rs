//! Email/password identity backend.
//!
//! Talks to an Identity Toolkit compatible REST API: account endpoints for
//! sign-in and sign-up, and a secure-token endpoint that trades a refresh
//! token for a new ID token. The signed-in user is persisted to a session
//! file so separate CLI runs share one sign-in.
//!
//! [`IdentityToolkit::auth_state_changes`] is the identity-change source fed
//! to [`crate::SessionProvider::subscribe`]; the toolkit itself is the
//! matching [`CredentialSource`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::Stream;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::IdentityConfig;
use crate::error::{Error, Result};
use crate::session::CredentialSource;
use crate::types::{Credential, Identity};

/// ID tokens closer than this to expiry are refreshed before use
const EXPIRY_SKEW_SECS: i64 = 5 * 60;

/// Persisted state of the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub identity: Identity,
    pub refresh_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredUser {
    fn cached_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.id_token.as_deref()?;
        let expires_at = self.expires_at?;
        (expires_at - now > Duration::seconds(EXPIRY_SKEW_SECS)).then_some(token)
    }
}

/// JSON file holding the signed-in user between runs
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<StoredUser>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    pub fn save(&self, user: &StoredUser) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(user)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// Friendlier text for the provider's error codes
fn describe_provider_error(code: &str) -> String {
    // Codes may carry a suffix, e.g. "WEAK_PASSWORD : Password should be at least 6 characters"
    let key = code.split(':').next().unwrap_or(code).trim();
    match key {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password.".to_string()
        }
        "EMAIL_EXISTS" => "An account with this email already exists.".to_string(),
        "USER_DISABLED" => "This account has been disabled.".to_string(),
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" => {
            "Sign-in expired, please sign in again.".to_string()
        }
        _ => code.to_string(),
    }
}

fn parse_expiry(expires_in: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    expires_in
        .trim()
        .parse::<i64>()
        .ok()
        .map(|secs| now + Duration::seconds(secs))
}

/// Client for the identity provider
pub struct IdentityToolkit {
    config: IdentityConfig,
    http: reqwest::Client,
    store: SessionStore,
    user: Mutex<Option<StoredUser>>,
    changes: watch::Sender<Option<Identity>>,
}

impl IdentityToolkit {
    /// Create the client and restore a persisted sign-in, if any
    pub fn new(config: IdentityConfig) -> Result<Self> {
        let store = SessionStore::new(config.session_file.clone());
        let user = store.load()?;
        if let Some(u) = &user {
            debug!(uid = %u.identity.uid, "Restored persisted sign-in");
        }
        let (changes, _rx) = watch::channel(user.as_ref().map(|u| u.identity.clone()));
        Ok(Self {
            config,
            http: reqwest::Client::new(),
            store,
            user: Mutex::new(user),
            changes,
        })
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.user.lock().as_ref().map(|u| u.identity.clone())
    }

    /// Identity-change stream: the current identity first, then every change
    pub fn auth_state_changes(&self) -> impl Stream<Item = Option<Identity>> + Send + 'static {
        let rx = self.changes.subscribe();
        futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if first {
                let current = rx.borrow_and_update().clone();
                return Some((current, (rx, false)));
            }
            match rx.changed().await {
                Ok(()) => {
                    let next = rx.borrow_and_update().clone();
                    Some((next, (rx, false)))
                }
                Err(_) => None,
            }
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        self.password_flow("accounts:signInWithPassword", email, password)
            .await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        self.password_flow("accounts:signUp", email, password).await
    }

    pub fn sign_out(&self) -> Result<()> {
        self.store.clear()?;
        let previous = self.user.lock().take();
        if let Some(u) = previous {
            info!(uid = %u.identity.uid, "Signed out");
        }
        self.changes.send_replace(None);
        Ok(())
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "Identity API key is not configured (set APIPROBE_API_KEY).".to_string(),
                )
            })
    }

    async fn password_flow(&self, endpoint: &str, email: &str, password: &str) -> Result<Identity> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::Validation("Email and password are required.".to_string()));
        }
        let url = format!(
            "{}/v1/{}",
            self.config.identity_toolkit_url.trim_end_matches('/'),
            endpoint
        );
        debug!(%url, "Identity request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key()?)])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;
        let account: AccountResponse = Self::read_provider_response(response).await?;

        let now = Utc::now();
        let identity = Identity {
            uid: account.local_id,
            display_name: account.display_name.filter(|n| !n.is_empty()),
            email: account.email.or_else(|| Some(email.to_string())),
        };
        let user = StoredUser {
            identity: identity.clone(),
            refresh_token: account.refresh_token,
            id_token: Some(account.id_token),
            expires_at: parse_expiry(&account.expires_in, now),
        };
        self.store.save(&user)?;
        *self.user.lock() = Some(user);
        info!(uid = %identity.uid, "Signed in");
        self.changes.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let url = format!(
            "{}/v1/token",
            self.config.secure_token_url.trim_end_matches('/')
        );
        debug!("Refreshing ID token");
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key()?)])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await?;
        Self::read_provider_response(response).await
    }

    async fn read_provider_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(match serde_json::from_str::<ProviderErrorBody>(&body) {
                Ok(parsed) => Error::Identity(describe_provider_error(&parsed.error.message)),
                Err(_) => Error::http_status(status.as_u16()),
            });
        }
        serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait]
impl CredentialSource for IdentityToolkit {
    async fn fresh_credential(&self, identity: &Identity) -> Result<Credential> {
        let refresh_token = {
            let guard = self.user.lock();
            let user = guard
                .as_ref()
                .filter(|u| u.identity.uid == identity.uid)
                .ok_or_else(|| Error::Identity(format!("{} is no longer signed in", identity.uid)))?;
            if let Some(token) = user.cached_token(Utc::now()) {
                return Ok(Credential::new(token));
            }
            user.refresh_token.clone()
        };

        let refreshed = self.refresh(&refresh_token).await?;
        let now = Utc::now();
        let mut guard = self.user.lock();
        match guard.as_mut().filter(|u| u.identity.uid == identity.uid) {
            Some(user) => {
                user.id_token = Some(refreshed.id_token.clone());
                user.refresh_token = refreshed.refresh_token;
                user.expires_at = parse_expiry(&refreshed.expires_in, now);
                if let Err(e) = self.store.save(user) {
                    warn!(error = %e, "Could not persist refreshed token");
                }
                Ok(Credential::new(refreshed.id_token))
            }
            None => Err(Error::Identity(format!(
                "{} signed out during token refresh",
                identity.uid
            ))),
        }
    }
}
