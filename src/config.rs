use crate::application::use_cases::aggregate_user_data::DEFAULT_COMMIT_FETCH_CONCURRENCY;
use crate::infrastructures::adapters::secondary::external_apis::github::DEFAULT_PER_PAGE;
use crate::infrastructures::adapters::secondary::sessions::in_memory::DEFAULT_SESSION_TTL;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth application client id
    pub github_client_id: String,
    /// OAuth application client secret
    pub github_client_secret: String,
    /// Redirect URI registered with the OAuth application
    pub github_callback_url: String,
    pub github_api_base_url: String,
    pub github_oauth_base_url: String,
    /// Page size requested from list and search endpoints
    pub github_per_page: u8,
    /// Upper bound on simultaneous commit lookups per request
    pub commit_fetch_concurrency: usize,
    pub host: String,
    pub port: u16,
    /// Directory holding index.html, profile.html and other static assets
    pub public_dir: PathBuf,
    /// Adds `Secure` to cookies; enable when served over HTTPS
    pub session_cookie_secure: bool,
    /// How long a login stays valid
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::MissingEnvVar(key));
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let commit_fetch_concurrency: usize = parse(
            &lookup,
            "COMMIT_FETCH_CONCURRENCY",
            DEFAULT_COMMIT_FETCH_CONCURRENCY,
        )?;
        if commit_fetch_concurrency == 0 {
            return Err(ConfigError::InvalidValue("COMMIT_FETCH_CONCURRENCY"));
        }

        let github_per_page: u8 = parse(&lookup, "GITHUB_PER_PAGE", DEFAULT_PER_PAGE)?;
        if !(1..=100).contains(&github_per_page) {
            return Err(ConfigError::InvalidValue("GITHUB_PER_PAGE"));
        }

        let session_ttl_secs: u64 =
            parse(&lookup, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL.as_secs())?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("SESSION_TTL_SECS"));
        }

        Ok(Self {
            github_client_id: required("GITHUB_CLIENT_ID")?,
            github_client_secret: required("GITHUB_CLIENT_SECRET")?,
            github_callback_url: or_default(
                "GITHUB_CALLBACK_URL",
                "http://localhost:3000/auth/github/callback",
            ),
            github_api_base_url: or_default("GITHUB_API_BASE_URL", "https://api.github.com"),
            github_oauth_base_url: or_default("GITHUB_OAUTH_BASE_URL", "https://github.com"),
            github_per_page,
            commit_fetch_concurrency,
            host: or_default("HOST", "127.0.0.1"),
            port: parse(&lookup, "PORT", 3000)?,
            public_dir: PathBuf::from(or_default("PUBLIC_DIR", "public")),
            session_cookie_secure: parse(&lookup, "SESSION_COOKIE_SECURE", false)?,
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
