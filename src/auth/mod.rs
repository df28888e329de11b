//! Authentication module
//!
//! Supports a static OAuth bearer token. The [`AuthTransport`] stage pulls a
//! token from a [`TokenSource`] for every request it forwards.

mod authenticator;
mod types;

pub use authenticator::{
    authorization_header, AuthTransport, SharedTokenSource, StaticTokenSource, TokenSource,
};
pub use types::Token;
