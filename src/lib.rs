//! sporlsync library
//!
//! Keeps a local music folder in sync with a Spotify playlist. The core of the
//! crate is the OAuth2 token lifecycle: credentials and tokens are persisted in
//! a local credential store, refreshed when they expire, and re-acquired
//! through a browser round-trip captured by a short-lived loopback server.
//!
//! # Modules
//!
//! - `api` - HTTP handler for the OAuth redirect
//! - `cli` - Command-line interface implementations
//! - `clock` - Time source used for expiry decisions
//! - `config` - Configuration loaded from the environment and `.env`
//! - `error` - Authentication error taxonomy
//! - `library` - Local music folder scan and playlist diff
//! - `management` - Credential store and token lifecycle manager
//! - `server` - Loopback callback receiver
//! - `spotify` - Spotify token endpoint and Web API clients
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use sporlsync::{config::AuthConfig, management::TokenManager};
//!
//! #[tokio::main]
//! async fn main() -> sporlsync::Res<()> {
//!     sporlsync::config::load_env().await?;
//!     let mut manager = TokenManager::load(AuthConfig::from_env()?).await?;
//!     let token = manager.get_access_token().await?;
//!     println!("{}", token);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod library;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Boxed-error result used at the application edges (startup, CLI).
///
/// Library layers return [`error::AuthError`]; this alias only collects
/// whatever reaches the top.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// ```
/// info!("{} of {} playlist tracks are missing", missing, total);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits with code 1.
///
/// Only for fatal errors at the CLI layer; library code returns errors instead.
///
/// ```
/// error!("Failed to load credentials. Please run sporlsync setup");
/// // not reached
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems, e.g. a refresh that falls back to a full
/// authorization or a callback carrying a foreign `state`.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
