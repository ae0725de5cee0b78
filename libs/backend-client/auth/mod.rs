//! Authentication service access

mod client;
mod identity_toolkit;
mod types;

pub use client::Auth;
pub use identity_toolkit::IdentityToolkitClient;
pub use types::{AuthBackend, AuthError, AuthSession, Result, TokenGrant, User, UserCredential};
