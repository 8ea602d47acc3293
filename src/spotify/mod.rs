//! # Spotify Integration Module
//!
//! HTTP clients for the two Spotify services sporlsync talks to.
//!
//! ```text
//! TokenManager / CLI
//!          ↓
//! Spotify Integration Layer
//!     ├── auth      (token endpoint: authorization code + refresh grants)
//!     └── playlist  (Web API: playlist items)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Authentication
//!
//! [`auth::TokenExchanger`] performs the Authorization Code and Refresh Token
//! grants against `accounts.spotify.com/api/token`, authenticating the client
//! with HTTP Basic credentials. It never decides *when* to refresh; that is
//! the job of [`crate::management::TokenManager`].
//!
//! ## Playlists
//!
//! [`playlist::get_tracks`] walks the paged `GET /playlists/{id}/tracks`
//! endpoint with a bearer token and returns lightweight [`crate::types::TrackRef`]s.
//!
//! ## Error Types
//!
//! - **`AuthError`** - token endpoint failures, see [`crate::error`]
//! - **`reqwest::Error`** - Web API failures while reading playlists

pub mod auth;
pub mod playlist;
