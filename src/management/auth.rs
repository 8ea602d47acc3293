use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::AuthConfig,
    error::AuthError,
    management::CredentialStore,
    server::CallbackReceiver,
    spotify::auth::TokenExchanger,
    types::{AuthorizationRequest, CallbackResult, TokenState},
    utils, warning,
};

/// Where the token lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    NoToken,
    Valid,
    Expired,
    Authorizing,
    Refreshing,
    Failed,
}

/// Presents the authorization URL to the user.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Opens the URL in the default browser, printing it when that fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) {
        if webbrowser::open(url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                url
            )
        }
    }
}

/// Owns the token state and decides between reusing, refreshing and a full
/// authorization round-trip.
///
/// Nothing else mutates the token: it is replaced only after a validated
/// exchange response has been persisted to the [`CredentialStore`].
pub struct TokenManager {
    config: AuthConfig,
    store: CredentialStore,
    exchanger: TokenExchanger,
    opener: Arc<dyn UrlOpener>,
    clock: Arc<dyn Clock>,
    token: Option<TokenState>,
    // Only the in-flight and terminal states are kept here; NoToken, Valid and
    // Expired follow from `token` and the clock.
    phase: Option<AuthStatus>,
}

impl TokenManager {
    pub async fn new(
        config: AuthConfig,
        store: CredentialStore,
        opener: Arc<dyn UrlOpener>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let (credentials, token) = store.load().await?;
        let exchanger = TokenExchanger::new(&config.token_url, credentials, Arc::clone(&clock));

        Ok(Self {
            config,
            store,
            exchanger,
            opener,
            clock,
            token,
            phase: None,
        })
    }

    /// Manager wired to the default credential store, the system browser and the wall clock.
    pub async fn load(config: AuthConfig) -> Result<Self, AuthError> {
        Self::new(
            config,
            CredentialStore::default_location(),
            Arc::new(SystemBrowser),
            Arc::new(SystemClock),
        )
        .await
    }

    pub fn status(&self) -> AuthStatus {
        if let Some(phase) = self.phase {
            return phase;
        }
        match &self.token {
            None => AuthStatus::NoToken,
            Some(token) if token.is_expired(self.clock.now()) => AuthStatus::Expired,
            Some(_) => AuthStatus::Valid,
        }
    }

    pub fn current_token(&self) -> Option<&TokenState> {
        self.token.as_ref()
    }

    /// Returns a usable access token, refreshing or re-authorizing as needed.
    ///
    /// While the cached token is valid this performs no I/O. A failed refresh
    /// falls back to one full authorization; any failure after that is terminal
    /// and reported as [`AuthError::Authentication`].
    pub async fn get_access_token(&mut self) -> Result<String, AuthError> {
        self.phase = None;

        let refresh_token = match &self.token {
            Some(token) if !token.is_expired(self.clock.now()) => {
                return Ok(token.access_token.clone());
            }
            Some(token) if token.has_refresh_token() => Some(token.refresh_token.clone()),
            _ => None,
        };

        if let Some(refresh_token) = refresh_token {
            self.phase = Some(AuthStatus::Refreshing);
            let refreshed = self.exchanger.exchange_refresh(&refresh_token).await;
            match refreshed {
                Ok(token) => return self.commit(token).await,
                Err(e @ AuthError::TokenExchange { .. }) => {
                    warning!("Token refresh failed ({}). Starting new authorization flow...", e);
                }
                Err(e) => return Err(self.fail(e)),
            }
        }

        self.authorize().await
    }

    /// Runs a full authorization round-trip regardless of the cached token.
    pub async fn authorize(&mut self) -> Result<String, AuthError> {
        self.phase = Some(AuthStatus::Authorizing);
        let authorized = self.run_authorization().await;
        match authorized {
            Ok(token) => self.commit(token).await,
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_authorization(&self) -> Result<TokenState, AuthError> {
        let request = AuthorizationRequest::new(&self.config.redirect_uri, &self.config.scope);
        let auth_url = request.authorize_url(
            &self.config.auth_url,
            self.exchanger.client_id(),
            self.config.show_dialog,
        )?;

        let handle = CallbackReceiver::start(
            &self.config.server_addr,
            &self.config.callback_path()?,
            &request.state_nonce,
        )
        .await?;

        self.opener.open(auth_url.as_str());

        let pb = utils::spinner("Waiting for authorization in the browser...");
        let result = handle.await_result(self.config.callback_timeout).await;
        pb.finish_and_clear();

        match result? {
            CallbackResult::Code(code) => {
                self.exchanger
                    .exchange_code(&code, &request.redirect_uri)
                    .await
            }
            CallbackResult::Error(error) => Err(AuthError::CallbackRejected(error)),
        }
    }

    async fn commit(&mut self, token: TokenState) -> Result<String, AuthError> {
        if let Err(e) = self.store.save(&token).await {
            return Err(self.fail(e));
        }

        let access_token = token.access_token.clone();
        self.token = Some(token);
        self.phase = None;
        Ok(access_token)
    }

    fn fail(&mut self, cause: AuthError) -> AuthError {
        self.phase = Some(AuthStatus::Failed);
        AuthError::Authentication(Box::new(cause))
    }
}
