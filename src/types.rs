use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{error::AuthError, utils};

/// Client credentials registered with the Spotify developer dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Current token pair together with its absolute expiry.
///
/// The three fields are only ever replaced together, so the expiry can never
/// describe a different access token than the one stored next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// A token is usable only while `now` is strictly before `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Raw token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Converts the relative `expires_in` into an absolute expiry at `received_at`.
    ///
    /// Returns `None` for an incomplete response or an `expires_in` that is not
    /// a positive, representable number of seconds.
    pub fn into_token_state(
        self,
        received_at: DateTime<Utc>,
        fallback_refresh_token: Option<&str>,
    ) -> Option<TokenState> {
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| fallback_refresh_token.map(str::to_string))?;

        if self.access_token.is_empty() || self.expires_in <= 0 {
            return None;
        }
        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime))?;

        Some(TokenState {
            access_token: self.access_token,
            refresh_token,
            expires_at,
        })
    }
}

/// One authorization attempt. Lives only in memory and is dropped once the
/// callback is captured or the attempt times out.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub state_nonce: String,
    pub redirect_uri: String,
    pub scope: BTreeSet<String>,
}

impl AuthorizationRequest {
    pub fn new(redirect_uri: &str, scope: &BTreeSet<String>) -> Self {
        Self {
            state_nonce: utils::generate_state_nonce(),
            redirect_uri: redirect_uri.to_string(),
            scope: scope.clone(),
        }
    }

    pub fn scope_param(&self) -> String {
        self.scope.iter().cloned().collect::<Vec<_>>().join(" ")
    }

    /// Builds the URL the user has to open in a browser.
    pub fn authorize_url(
        &self,
        auth_url: &str,
        client_id: &str,
        show_dialog: bool,
    ) -> Result<Url, AuthError> {
        Url::parse_with_params(
            auth_url,
            &[
                ("client_id", client_id),
                ("response_type", "code"),
                ("redirect_uri", &self.redirect_uri),
                ("scope", &self.scope_param()),
                ("state", &self.state_nonce),
                ("show_dialog", if show_dialog { "true" } else { "false" }),
            ],
        )
        .map_err(|e| AuthError::Configuration(format!("invalid authorization url: {}", e)))
    }
}

/// Outcome of the single redirect captured by the callback receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    Code(String),
    Error(String),
}

/// A track as known by its display name, either remote or local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub name: String,
    pub artists: Vec<String>,
}

impl TrackRef {
    pub fn local(name: &str) -> Self {
        Self {
            name: name.to_string(),
            artists: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksResponse {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    // Removed or unavailable tracks come back as `null`.
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artists: Vec<TrackArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtist {
    pub name: String,
}

impl From<Track> for TrackRef {
    fn from(track: Track) -> Self {
        TrackRef {
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
        }
    }
}

#[derive(Tabled)]
pub struct MissingTrackRow {
    pub name: String,
    pub artists: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(expires_at: DateTime<Utc>) -> TokenState {
        TokenState {
            access_token: "AT".to_string(),
            refresh_token: "RT".to_string(),
            expires_at,
        }
    }

    #[test]
    fn token_expiring_now_is_expired() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert!(token(now).is_expired(now));
        assert!(!token(now + Duration::seconds(1)).is_expired(now));
        assert!(token(now - Duration::seconds(1)).is_expired(now));
    }

    #[test]
    fn response_without_refresh_token_keeps_previous_one() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let resp = TokenResponse {
            access_token: "AT2".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: Some("Bearer".to_string()),
            scope: None,
        };

        let state = resp.into_token_state(now, Some("RT1")).unwrap();
        assert_eq!(state.refresh_token, "RT1");
        assert_eq!(state.expires_at, now + Duration::seconds(3600));
    }

    #[test]
    fn response_without_any_refresh_token_is_rejected() {
        let resp = TokenResponse {
            access_token: "AT".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: None,
            scope: None,
        };

        assert!(resp.into_token_state(Utc::now(), None).is_none());
    }

    #[test]
    fn out_of_range_lifetime_is_rejected() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let resp = |expires_in: i64| TokenResponse {
            access_token: "AT".to_string(),
            refresh_token: Some("RT".to_string()),
            expires_in,
            token_type: None,
            scope: None,
        };

        assert!(resp(i64::MAX).into_token_state(now, None).is_none());
        assert!(resp(i64::MAX / 1000).into_token_state(now, None).is_none());
        assert!(resp(0).into_token_state(now, None).is_none());
        assert!(resp(-60).into_token_state(now, None).is_none());
        assert!(resp(1).into_token_state(now, None).is_some());
    }

    #[test]
    fn authorize_url_carries_state_and_scope() {
        let scope: BTreeSet<String> = ["user-read-private", "playlist-read-private"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let req = AuthorizationRequest::new("http://127.0.0.1:8000/callback", &scope);
        let url = req
            .authorize_url("https://accounts.spotify.com/authorize", "abc", true)
            .unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("client_id"), "abc");
        assert_eq!(get("response_type"), "code");
        assert_eq!(get("redirect_uri"), "http://127.0.0.1:8000/callback");
        assert_eq!(get("scope"), "playlist-read-private user-read-private");
        assert_eq!(get("state"), req.state_nonce);
        assert_eq!(get("show_dialog"), "true");
    }
}
