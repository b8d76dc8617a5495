//! Session-related types.
//!
//! Types stored in the session for authentication state.

use secrecy::SecretString;

use pedalhub_core::User;

/// The logged-in user together with the token the backend issued.
#[derive(Debug)]
pub struct CurrentSession {
    /// Opaque bearer token, forwarded on authenticated backend calls.
    pub token: SecretString,
    /// User record captured at login.
    pub user: User,
}

/// Session keys for authentication and cart data.
pub mod keys {
    /// Key for the opaque access token string.
    pub const TOKEN: &str = "token";

    /// Key for the serialized user object.
    pub const USER: &str = "user";

    /// Key for the serialized shopping cart.
    pub const CART: &str = "cart";
}
