use std::path::PathBuf;

use tabled::Table;

use crate::{
    config::{self, AuthConfig},
    error, info, library, spotify, success,
    types::MissingTrackRow,
    utils,
};

use super::auth::load_manager;

pub async fn sync(config: AuthConfig, playlist: String, dir: Option<PathBuf>) {
    let Some(playlist_id) = utils::parse_playlist_id(&playlist) else {
        error!("'{}' is not a Spotify playlist id, URI or link", playlist)
    };

    let mut manager = load_manager(config.clone()).await;
    let token = match manager.get_access_token().await {
        Ok(token) => token,
        Err(e) => error!("{}", e),
    };

    let pb = utils::spinner("Fetching playlist tracks...");
    let remote = spotify::playlist::get_tracks(&config.api_url, &token, &playlist_id).await;
    pb.finish_and_clear();
    let remote = match remote {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to fetch playlist {}. Err: {}", playlist_id, e),
    };

    let dir = dir.unwrap_or_else(config::music_dir);
    let local = match library::list_local_tracks(&dir).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Cannot read music folder {}. Err: {}", dir.display(), e),
    };

    let missing = library::missing_tracks(&remote, &local);
    if missing.is_empty() {
        success!(
            "All {} playlist tracks are present in {}",
            remote.len(),
            dir.display()
        );
        return;
    }

    info!(
        "{} of {} playlist tracks are missing in {}",
        missing.len(),
        remote.len(),
        dir.display()
    );

    let rows: Vec<MissingTrackRow> = missing
        .into_iter()
        .map(|t| MissingTrackRow {
            name: t.name,
            artists: t.artists.join(", "),
        })
        .collect();
    println!("{}", Table::new(rows));
}
