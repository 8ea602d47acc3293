mod auth;
mod credentials;

pub use auth::AuthStatus;
pub use auth::SystemBrowser;
pub use auth::TokenManager;
pub use auth::UrlOpener;
pub use credentials::CredentialStore;
