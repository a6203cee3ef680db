//! Backend configuration
//!
//! Read at build time so the web bundle needs no runtime config fetch.
//! Missing values mean the game runs against the offline in-memory backend.

use serde::{Deserialize, Serialize};

/// Default identity endpoint for email/password and IdP sign-in
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default endpoint exchanging a refresh token for a new id token
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Hosted auth + realtime database settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Public web API key
    pub api_key: String,
    /// Realtime database root, e.g. `https://example.firebaseio.com`
    pub database_url: String,
    /// Identity REST root
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Id token refresh endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

impl BackendConfig {
    pub fn new(api_key: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            database_url: database_url.into(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
        }
    }

    /// Values baked in with `STELLAR_VANGUARD_API_KEY` / `STELLAR_VANGUARD_DB_URL`
    pub fn from_build_env() -> Option<Self> {
        Self::from_parts(
            option_env!("STELLAR_VANGUARD_API_KEY"),
            option_env!("STELLAR_VANGUARD_DB_URL"),
            option_env!("STELLAR_VANGUARD_AUTH_URL"),
        )
    }

    fn from_parts(
        api_key: Option<&str>,
        database_url: Option<&str>,
        auth_url: Option<&str>,
    ) -> Option<Self> {
        let api_key = api_key.map(str::trim).filter(|s| !s.is_empty())?;
        let database_url = database_url.map(str::trim).filter(|s| !s.is_empty())?;
        let mut config = Self::new(api_key, database_url.trim_end_matches('/'));
        if let Some(url) = auth_url.map(str::trim).filter(|s| !s.is_empty()) {
            config.auth_url = url.trim_end_matches('/').to_string();
        }
        Some(config)
    }
}
