use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::types::{PlaylistTracksResponse, TrackRef};

const PAGE_LIMIT: u32 = 100;
const MAX_BAD_GATEWAY_RETRIES: u32 = 3;

/// Fetches every track of a playlist, following the `next` links page by page.
///
/// Entries whose track is no longer available (`"track": null`) are skipped.
/// A 502 Bad Gateway is retried a few times with a short pause, any other
/// error status is returned as is.
pub async fn get_tracks(
    api_url: &str,
    token: &str,
    playlist_id: &str,
) -> Result<Vec<TrackRef>, reqwest::Error> {
    let client = Client::new();
    let mut tracks = Vec::new();
    let mut next = Some(format!(
        "{uri}/playlists/{playlist_id}/tracks?limit={limit}&offset=0",
        uri = api_url.trim_end_matches('/'),
        playlist_id = playlist_id,
        limit = PAGE_LIMIT,
    ));

    while let Some(url) = next {
        let page = get_page(&client, &url, token).await?;
        tracks.extend(
            page.items
                .into_iter()
                .filter_map(|item| item.track)
                .map(TrackRef::from),
        );
        next = page.next;
    }

    Ok(tracks)
}

async fn get_page(
    client: &Client,
    url: &str,
    token: &str,
) -> Result<PlaylistTracksResponse, reqwest::Error> {
    let mut attempt = 0;

    loop {
        let response = client.get(url).bearer_auth(token).send().await?;

        match response.error_for_status() {
            Ok(valid_response) => return valid_response.json::<PlaylistTracksResponse>().await,
            Err(err) => {
                if err.status() == Some(StatusCode::BAD_GATEWAY) && attempt < MAX_BAD_GATEWAY_RETRIES
                {
                    attempt += 1;
                    sleep(Duration::from_secs(2)).await;
                    continue; // retry
                }
                return Err(err);
            }
        }
    }
}
