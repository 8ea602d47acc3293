use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};

use crate::types::{Credentials, TrackRef};

/// Generates the anti-CSRF `state` value for one authorization attempt.
///
/// Returns 32 random alphanumeric characters, which is URL-safe without any
/// further encoding.
pub fn generate_state_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Builds the `Authorization` header value used against the token endpoint:
/// `Basic base64(client_id:client_secret)`.
pub fn basic_auth_header(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.client_id, credentials.client_secret);
    format!("Basic {}", STANDARD.encode(raw))
}

/// Lowercases and collapses whitespace so file names and track titles compare equal.
pub fn normalize_track_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Names a local file may carry for the given playlist track, already normalized.
///
/// Accepts both `"{artists} - {title}"` and a bare `"{title}"`.
pub fn track_file_keys(track: &TrackRef) -> Vec<String> {
    let mut keys = vec![normalize_track_name(&track.name)];
    if !track.artists.is_empty() {
        keys.push(normalize_track_name(&format!(
            "{} - {}",
            track.artists.join(", "),
            track.name
        )));
        if let Some(first) = track.artists.first() {
            keys.push(normalize_track_name(&format!("{} - {}", first, track.name)));
        }
    }
    keys.dedup();
    keys
}

/// Accepts a bare playlist id, a `spotify:playlist:<id>` URI or an
/// `open.spotify.com/playlist/<id>` link.
pub fn parse_playlist_id(input: &str) -> Option<String> {
    let input = input.trim();
    let id = if let Some(rest) = input.strip_prefix("spotify:playlist:") {
        rest
    } else if let Some(pos) = input.find("/playlist/") {
        let rest = &input[pos + "/playlist/".len()..];
        rest.split(['?', '#', '/']).next().unwrap_or_default()
    } else {
        input
    };

    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// Spinner shown while waiting on the network or the browser.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
