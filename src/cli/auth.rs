use crate::{
    config::AuthConfig,
    error, info,
    management::{AuthStatus, CredentialStore, TokenManager},
    success,
};

pub(crate) async fn load_manager(config: AuthConfig) -> TokenManager {
    match TokenManager::load(config).await {
        Ok(manager) => manager,
        Err(e) => error!(
            "Failed to load credentials. Please run sporlsync setup\n Error: {}",
            e
        ),
    }
}

pub async fn auth(config: AuthConfig) {
    let mut manager = load_manager(config).await;
    match manager.authorize().await {
        Ok(_) => success!("Authentication successful!"),
        Err(e) => error!("{}", e),
    }
}

pub async fn token(config: AuthConfig) {
    let mut manager = load_manager(config).await;
    match manager.get_access_token().await {
        Ok(token) => println!("{}", token),
        Err(e) => error!("{}", e),
    }
}

pub async fn status(config: AuthConfig) {
    let manager = load_manager(config).await;
    match (manager.status(), manager.current_token()) {
        (AuthStatus::Valid, Some(token)) => success!(
            "Access token valid until {}",
            token.expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        ),
        (AuthStatus::Expired, Some(token)) => info!(
            "Access token expired at {}, it will be refreshed on next use",
            token.expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        ),
        _ => info!("No token stored. Run `sporlsync auth` to authorize."),
    }
}

pub async fn logout() {
    let store = CredentialStore::default_location();
    match store.clear_token().await {
        Ok(()) => success!("Stored token removed."),
        Err(e) => error!("Failed to remove token. Err: {}", e),
    }
}
