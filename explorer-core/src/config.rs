use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const BACKEND_URL_ENV: &str = "EXPLORER_BACKEND_URL";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Credentials for the identity provider (Firebase project + Google OAuth client).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Firebase web API key.
    pub api_key: String,
    /// Google OAuth client id used for the consent screen.
    pub google_client_id: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

impl IdentityConfig {
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// backend_url = "https://abc123.ngrok.io"
/// request_timeout_secs = 20
///
/// [identity]
/// api_key = "..."
/// google_client_id = "....apps.googleusercontent.com"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub backend_url: Option<String>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub identity: Option<IdentityConfig>,
}

impl Config {
    /// Backend base URL: environment, then config file, then the local default.
    pub fn backend_url(&self) -> String {
        self.resolve_backend_url(std::env::var(BACKEND_URL_ENV).ok())
    }

    fn resolve_backend_url(&self, from_env: Option<String>) -> String {
        let url = from_env
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        url.trim().trim_end_matches('/').to_string()
    }

    /// Validate and store the backend base URL.
    pub fn set_backend_url(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url.trim())
            .with_context(|| format!("Invalid backend URL: {url}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Backend URL must use http or https, got '{}'",
                parsed.scheme()
            ));
        }

        self.backend_url = Some(url.trim().trim_end_matches('/').to_string());
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Identity credentials, or a hint on how to configure them.
    pub fn identity(&self) -> Result<&IdentityConfig> {
        self.identity.as_ref().ok_or_else(|| {
            anyhow!(
                "No identity provider configured.\n\
                 Hint: run `vnexplorer configure identity` and enter your Firebase credentials."
            )
        })
    }

    pub fn set_identity(&mut self, identity: IdentityConfig) {
        self.identity = Some(identity);
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where the identity adapter keeps the signed-in session.
    pub fn session_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("session.json"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "vn-explorer", "vnexplorer")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
