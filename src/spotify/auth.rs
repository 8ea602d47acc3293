use std::sync::Arc;

use reqwest::{Client, header};

use crate::{
    clock::Clock,
    error::AuthError,
    types::{Credentials, TokenResponse, TokenState},
    utils,
};

/// Talks to the provider's token endpoint for both grants the client uses.
///
/// Client credentials travel in a Basic `Authorization` header, the grant
/// parameters in an `application/x-www-form-urlencoded` body. A response is
/// only turned into a [`TokenState`] once it has been fully validated; any
/// non-success status surfaces as [`AuthError::TokenExchange`].
#[derive(Clone)]
pub struct TokenExchanger {
    client: Client,
    token_url: String,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl TokenExchanger {
    pub fn new(token_url: &str, credentials: Credentials, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: Client::new(),
            token_url: token_url.to_string(),
            credentials,
            clock,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    /// Authorization Code grant.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenState, AuthError> {
        self.request(
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
            None,
        )
        .await
    }

    /// Refresh Token grant. A response without a new refresh token keeps the old one.
    pub async fn exchange_refresh(&self, refresh_token: &str) -> Result<TokenState, AuthError> {
        self.request(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
            Some(refresh_token),
        )
        .await
    }

    async fn request(
        &self,
        form: &[(&str, &str)],
        previous_refresh_token: Option<&str>,
    ) -> Result<TokenState, AuthError> {
        let res = self
            .client
            .post(&self.token_url)
            .header(
                header::AUTHORIZATION,
                utils::basic_auth_header(&self.credentials),
            )
            .form(form)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        let received_at = self.clock.now();

        if !status.is_success() {
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let token = serde_json::from_str::<TokenResponse>(&body)
            .ok()
            .and_then(|resp| resp.into_token_state(received_at, previous_refresh_token));

        token.ok_or(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            })
    }
}
