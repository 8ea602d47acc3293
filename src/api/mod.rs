//! # API Module
//!
//! HTTP handlers served by the local callback receiver (see [`crate::server`]).
//!
//! ## Endpoints
//!
//! - [`callback`] - Captures the single OAuth redirect carrying either a `code`
//!   or an `error`, after checking its `state` against the nonce issued for the
//!   current authorization attempt.
//!
//! The handler never talks to the token endpoint itself. It only hands the
//! captured result to the waiting token manager through a oneshot channel.

mod callback;

pub use callback::CallbackState;
pub use callback::callback;
