//! Defines the credential bundle kept in the session store.

use serde::{Deserialize, Serialize};

/// The user name and the opaque token issued by the auth service at log in.
///
/// Stored as JSON under [crate::session::TOKEN_KEY], e.g.
/// `{"user":"ana","token":"eyJhbGciOi..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionToken {
    /// The name the user logged in with.
    pub user: String,
    /// The credential sent as a bearer token to the backend.
    pub token: String,
}
