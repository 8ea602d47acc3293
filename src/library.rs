//! Local music folder scanning and the playlist diff.

use std::{collections::HashSet, path::Path};

use futures::StreamExt;

use crate::{types::TrackRef, utils};

/// Lists the regular files directly inside `dir` as tracks named by their file stem.
///
/// Hidden files are skipped. A missing directory yields an empty list so a
/// first sync into a fresh folder reports every playlist track as missing.
pub async fn list_local_tracks(dir: &Path) -> std::io::Result<Vec<TrackRef>> {
    let mut entries = match async_fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut tracks = Vec::new();
    while let Some(entry) = entries.next().await {
        let entry = entry?;
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('.') || stem.is_empty() {
            continue;
        }
        tracks.push(TrackRef::local(stem));
    }

    tracks.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tracks)
}

/// Playlist tracks that have no matching local file, in playlist order.
pub fn missing_tracks(playlist: &[TrackRef], local: &[TrackRef]) -> Vec<TrackRef> {
    let local_names: HashSet<String> = local
        .iter()
        .map(|t| utils::normalize_track_name(&t.name))
        .collect();

    let mut seen = HashSet::new();
    playlist
        .iter()
        .filter(|track| {
            !utils::track_file_keys(track)
                .iter()
                .any(|key| local_names.contains(key))
        })
        .filter(|track| seen.insert(utils::track_file_keys(track)))
        .cloned()
        .collect()
}
