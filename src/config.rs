//! Configuration management for sporlsync.
//!
//! Endpoint and server settings are read from environment variables, which may
//! be supplied through a `.env` file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Spotify defaults
//!
//! The values are collected once into an [`AuthConfig`] that is handed to the
//! token manager, so nothing reads the environment after startup. Client
//! credentials and tokens live in the credential store, not here.

use std::{collections::BTreeSet, env, path::PathBuf, time::Duration};

use reqwest::Url;

use crate::{Res, error::AuthError};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8000/callback";
pub const DEFAULT_SCOPE: &str = "user-read-private playlist-read-private playlist-read-collaborative";
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Loads `<data_local_dir>/sporlsync/.env` into the process environment.
///
/// A missing file is not an error; variables already set in the environment
/// take precedence over the file.
pub async fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)?;
    }
    Ok(())
}

pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlsync");
    path
}

pub fn credentials_path() -> PathBuf {
    data_dir().join("credentials.env")
}

/// Music folder to synchronize; `SPORLSYNC_MUSIC_DIR` overrides `~/Music`.
pub fn music_dir() -> PathBuf {
    if let Ok(dir) = env::var("SPORLSYNC_MUSIC_DIR") {
        return PathBuf::from(dir);
    }
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("Music");
    path
}

/// Everything the authorization flow needs to know about the provider and the
/// local callback receiver.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub redirect_uri: String,
    pub scope: BTreeSet<String>,
    /// Address the callback receiver binds to; must match `redirect_uri`.
    pub server_addr: String,
    pub callback_timeout: Duration,
    pub show_dialog: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: parse_scope(DEFAULT_SCOPE),
            server_addr: "127.0.0.1:8000".to_string(),
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            show_dialog: false,
        }
    }
}

impl AuthConfig {
    /// Builds a config whose receiver listens on the host and port of `redirect_uri`.
    pub fn with_redirect_uri(redirect_uri: &str) -> Result<Self, AuthError> {
        let server_addr = server_addr_from_redirect(redirect_uri)?;
        Ok(Self {
            redirect_uri: redirect_uri.to_string(),
            server_addr,
            ..Self::default()
        })
    }

    pub fn from_env() -> Result<Self, AuthError> {
        let redirect_uri = env_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI);
        let server_addr = match env::var("SERVER_ADDRESS") {
            Ok(addr) if !addr.trim().is_empty() => addr,
            _ => server_addr_from_redirect(&redirect_uri)?,
        };

        let callback_timeout = match env::var("SPOTIFY_CALLBACK_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                AuthError::Configuration(format!(
                    "SPOTIFY_CALLBACK_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_CALLBACK_TIMEOUT,
        };

        let show_dialog = matches!(
            env::var("SPOTIFY_SHOW_DIALOG").as_deref().map(str::trim),
            Ok("1") | Ok("true") | Ok("yes")
        );

        let config = Self {
            auth_url: env_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: env_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: env_or("SPOTIFY_API_URL", DEFAULT_API_URL),
            redirect_uri,
            scope: parse_scope(&env_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)),
            server_addr,
            callback_timeout,
            show_dialog,
        };
        config.callback_path()?;
        Ok(config)
    }

    /// Path component of `redirect_uri`, the only route the receiver serves.
    ///
    /// Segments starting with `:` or `*` would be read as route captures, so
    /// they are rejected here.
    pub fn callback_path(&self) -> Result<String, AuthError> {
        let url = parse_redirect(&self.redirect_uri)?;
        let path = url.path();
        if path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            return Err(AuthError::Configuration(format!(
                "redirect uri path '{}' must not contain segments starting with ':' or '*'",
                path
            )));
        }
        Ok(path.to_string())
    }
}

pub fn parse_scope(raw: &str) -> BTreeSet<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_redirect(redirect_uri: &str) -> Result<Url, AuthError> {
    Url::parse(redirect_uri).map_err(|e| {
        AuthError::Configuration(format!("invalid redirect uri '{}': {}", redirect_uri, e))
    })
}

fn server_addr_from_redirect(redirect_uri: &str) -> Result<String, AuthError> {
    let url = parse_redirect(redirect_uri)?;
    let host = url.host_str().ok_or_else(|| {
        AuthError::Configuration(format!("redirect uri '{}' has no host", redirect_uri))
    })?;
    let port = url.port_or_known_default().ok_or_else(|| {
        AuthError::Configuration(format!("redirect uri '{}' has no port", redirect_uri))
    })?;
    Ok(format!("{}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_addr_follows_redirect_uri() {
        let config = AuthConfig::with_redirect_uri("http://localhost:8080/callback").unwrap();
        assert_eq!(config.server_addr, "localhost:8080");
        assert_eq!(config.callback_path().unwrap(), "/callback");
    }

    #[test]
    fn invalid_redirect_uri_is_a_configuration_error() {
        let err = AuthConfig::with_redirect_uri("not a url").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn capture_like_redirect_path_is_a_configuration_error() {
        for uri in [
            "http://127.0.0.1:8000/:callback",
            "http://127.0.0.1:8000/auth/*rest",
        ] {
            let config = AuthConfig::with_redirect_uri(uri).unwrap();
            assert!(config.callback_path().unwrap_err().is_configuration());
        }
    }

    #[test]
    fn scope_is_split_on_whitespace() {
        let scope = parse_scope("  user-read-private   playlist-read-private ");
        assert_eq!(scope.len(), 2);
        assert!(scope.contains("user-read-private"));
    }
}
