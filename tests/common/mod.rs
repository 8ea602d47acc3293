#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use reqwest::Url;
use sporlsync::{
    config::AuthConfig,
    management::{CredentialStore, UrlOpener},
    types::{Credentials, TokenState},
};
use wiremock::MockServer;

pub const BASIC_ABC_XYZ: &str = "Basic YWJjOnh5eg==";

pub fn credentials() -> Credentials {
    Credentials {
        client_id: "abc".to_string(),
        client_secret: "xyz".to_string(),
    }
}

pub fn token(access: &str, refresh: &str, expires_at: DateTime<Utc>) -> TokenState {
    TokenState {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at,
    }
}

/// Credential store inside `dir` holding the test credentials and optionally a token.
pub async fn seeded_store(dir: &Path, token: Option<&TokenState>) -> CredentialStore {
    let store = CredentialStore::new(dir.join("credentials.env"));
    store.save_credentials(&credentials()).await.unwrap();
    if let Some(token) = token {
        store.save(token).await.unwrap();
    }
    store
}

/// Auth config pointing the token endpoint at `server` and the receiver at `port`.
pub fn config_for(server: &MockServer, port: u16) -> AuthConfig {
    let mut config =
        AuthConfig::with_redirect_uri(&format!("http://127.0.0.1:{}/callback", port)).unwrap();
    config.auth_url = format!("{}/authorize", server.uri());
    config.token_url = format!("{}/api/token", server.uri());
    config.callback_timeout = Duration::from_secs(5);
    config
}

#[derive(Debug, Clone)]
pub enum Visit {
    Code(&'static str),
    Error(&'static str),
    WrongState(&'static str),
}

/// Stands in for the user's browser: follows the authorization URL straight
/// to the redirect URI with the configured query parameters.
#[derive(Default, Clone)]
pub struct MockBrowser {
    visits: Vec<Visit>,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub statuses: Arc<Mutex<Vec<u16>>>,
}

impl MockBrowser {
    pub fn visiting(visits: Vec<Visit>) -> Self {
        Self {
            visits,
            ..Self::default()
        }
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<u16> {
        self.statuses.lock().unwrap().clone()
    }

    /// Waits until `count` callback responses have been seen by the browser.
    pub async fn wait_for_statuses(&self, count: usize) -> Vec<u16> {
        for _ in 0..100 {
            let statuses = self.statuses();
            if statuses.len() >= count {
                return statuses;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.statuses()
    }
}

impl UrlOpener for MockBrowser {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
        if self.visits.is_empty() {
            return;
        }

        let params: HashMap<String, String> =
            Url::parse(url).unwrap().query_pairs().into_owned().collect();
        let redirect_uri = params["redirect_uri"].clone();
        let state = params["state"].clone();
        let visits = self.visits.clone();
        let statuses = Arc::clone(&self.statuses);

        tokio::spawn(async move {
            let client = reqwest::Client::new();
            for visit in visits {
                let query = match visit {
                    Visit::Code(code) => [("code", code.to_string()), ("state", state.clone())],
                    Visit::Error(error) => {
                        [("error", error.to_string()), ("state", state.clone())]
                    }
                    Visit::WrongState(code) => {
                        [("code", code.to_string()), ("state", "forged".to_string())]
                    }
                };
                let resp = client
                    .get(&redirect_uri)
                    .query(&query)
                    .send()
                    .await
                    .unwrap();
                statuses.lock().unwrap().push(resp.status().as_u16());
            }
        });
    }
}
