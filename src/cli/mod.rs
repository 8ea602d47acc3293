//! # CLI Module
//!
//! User-facing commands. Each command loads what it needs (configuration,
//! credential store, token manager), delegates to the library layers and
//! reports the outcome with the terminal macros from the crate root.
//!
//! ## Commands
//!
//! - [`setup`] - Prompts for the Spotify client id and secret and stores them
//! - [`auth`] - Runs the browser authorization flow and stores the token pair
//! - [`token`] - Prints a valid access token, refreshing it when needed
//! - [`status`] - Shows the current token lifecycle state
//! - [`logout`] - Forgets the stored token pair, keeping the credentials
//! - [`sync`] - Lists playlist tracks that are missing from the music folder
//!
//! ```bash
//! sporlsync setup
//! sporlsync auth
//! sporlsync sync --playlist spotify:playlist:37i9dQZF1DXcBWIGoYBM5M
//! ```
//!
//! Fatal problems end the process through [`crate::error!`] with one
//! actionable message.

mod auth;
mod setup;
mod sync;

pub use auth::auth;
pub use auth::logout;
pub use auth::status;
pub use auth::token;
pub use setup::setup;
pub use sync::sync;
