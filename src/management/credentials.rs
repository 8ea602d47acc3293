use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use futures::AsyncWriteExt;
use rand::{Rng, distr::Alphanumeric};

use crate::{
    config,
    error::AuthError,
    types::{Credentials, TokenState},
};

pub const KEY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const KEY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const KEY_ACCESS_TOKEN: &str = "SPOTIFY_ACCESS_TOKEN";
pub const KEY_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";
pub const KEY_EXPIRES_AT: &str = "SPOTIFY_TOKEN_EXPIRES_AT";

/// Persisted key/value record holding the client credentials and the current
/// token state, stored as a dotenv-style file.
///
/// Every write replaces the whole record: the new content goes to a sibling
/// temporary file which is synced and then renamed over the real one, so a
/// crash can only ever leave the old or the new record behind. On Unix the
/// record is readable by its owner only.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        Self::new(config::credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads credentials and, if all token fields are present, the token state.
    pub async fn load(&self) -> Result<(Credentials, Option<TokenState>), AuthError> {
        let record = self.read_record().await?;
        let credentials = credentials_from(&record)?;
        Ok((credentials, token_from(&record)?))
    }

    /// Replaces the persisted token fields, keeping the stored credentials.
    pub async fn save(&self, token: &TokenState) -> Result<(), AuthError> {
        let record = self.read_record().await?;
        let credentials = credentials_from(&record)?;
        self.write_record(&credentials, Some(token)).await
    }

    /// Creates or replaces the record with new credentials and no token.
    pub async fn save_credentials(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if credentials.client_id.trim().is_empty() || credentials.client_secret.trim().is_empty()
        {
            return Err(AuthError::Configuration(
                "client id and client secret must not be empty".to_string(),
            ));
        }
        self.write_record(credentials, None).await
    }

    /// Drops the token fields, keeping the credentials.
    pub async fn clear_token(&self) -> Result<(), AuthError> {
        let record = self.read_record().await?;
        let credentials = credentials_from(&record)?;
        self.write_record(&credentials, None).await
    }

    async fn read_record(&self) -> Result<HashMap<String, String>, AuthError> {
        let entries = match dotenv::from_path_iter(&self.path) {
            Ok(entries) => entries,
            Err(dotenv::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AuthError::Configuration(format!(
                    "no credentials found at {}, run `sporlsync setup` first",
                    self.path.display()
                )));
            }
            Err(dotenv::Error::Io(e)) => return Err(AuthError::Io(e)),
            Err(e) => return Err(self.parse_error(e)),
        };

        let mut record = HashMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|e| self.parse_error(e))?;
            record.insert(key, value);
        }
        Ok(record)
    }

    fn parse_error(&self, e: dotenv::Error) -> AuthError {
        AuthError::Configuration(format!(
            "cannot parse credential store {}: {}",
            self.path.display(),
            e
        ))
    }

    async fn write_record(
        &self,
        credentials: &Credentials,
        token: Option<&TokenState>,
    ) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let mut content = String::from("# sporlsync credential store\n");
        push_entry(&mut content, KEY_CLIENT_ID, &credentials.client_id);
        push_entry(&mut content, KEY_CLIENT_SECRET, &credentials.client_secret);
        if let Some(token) = token {
            push_entry(&mut content, KEY_ACCESS_TOKEN, &token.access_token);
            push_entry(&mut content, KEY_REFRESH_TOKEN, &token.refresh_token);
            push_entry(
                &mut content,
                KEY_EXPIRES_AT,
                &token.expires_at.timestamp().to_string(),
            );
        }

        let tmp_path = self.tmp_path();
        if let Err(e) = write_synced(&tmp_path, content.as_bytes()).await {
            let _ = async_fs::remove_file(&tmp_path).await;
            return Err(AuthError::Io(e));
        }

        if let Err(e) = async_fs::rename(&tmp_path, &self.path).await {
            let _ = async_fs::remove_file(&tmp_path).await;
            return Err(AuthError::Io(e));
        }
        Ok(())
    }

    // Unique per writer so concurrent processes never share a temporary file.
    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credentials.env".to_string());
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        self.path
            .with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), suffix))
    }
}

/// Writes `content` to a new file that is owner-only from the moment it exists
/// and flushed to disk before returning.
async fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut options = async_fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use async_fs::unix::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await
}

fn push_entry(content: &mut String, key: &str, value: &str) {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    content.push_str(&format!("{}=\"{}\"\n", key, escaped));
}

fn non_empty<'a>(record: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn credentials_from(record: &HashMap<String, String>) -> Result<Credentials, AuthError> {
    match (
        non_empty(record, KEY_CLIENT_ID),
        non_empty(record, KEY_CLIENT_SECRET),
    ) {
        (Some(client_id), Some(client_secret)) => Ok(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }),
        _ => Err(AuthError::Configuration(format!(
            "{} and {} must both be set in the credential store",
            KEY_CLIENT_ID, KEY_CLIENT_SECRET
        ))),
    }
}

fn token_from(record: &HashMap<String, String>) -> Result<Option<TokenState>, AuthError> {
    let (Some(access_token), Some(refresh_token), Some(expires_at)) = (
        non_empty(record, KEY_ACCESS_TOKEN),
        non_empty(record, KEY_REFRESH_TOKEN),
        non_empty(record, KEY_EXPIRES_AT),
    ) else {
        return Ok(None);
    };

    Ok(Some(TokenState {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        expires_at: parse_expiry(expires_at)?,
    }))
}

/// Accepts whole unix seconds as well as fractional ones.
fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, AuthError> {
    let secs = match raw.parse::<i64>() {
        Ok(secs) => Some(secs),
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.floor() as i64),
    };

    secs.and_then(|s| DateTime::from_timestamp(s, 0)).ok_or_else(|| {
        AuthError::Configuration(format!("invalid {} value '{}'", KEY_EXPIRES_AT, raw))
    })
}
