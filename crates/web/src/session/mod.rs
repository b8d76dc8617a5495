//! Session management.
//!
//! All reads and writes of login state and the cart go through
//! [`SessionManager`], which sits on top of an injectable [`SessionStorage`].
//! Production uses [`TowerSessionStorage`]; tests use [`MemoryStorage`].
//!
//! The `token` cookie mirrors login state so the route guard can see it
//! without touching the session store. See [`cookie`].
//!
//! Writes are last-write-wins. They only happen on login, logout and cart
//! edits, all user-driven.

pub mod cookie;
mod storage;

pub use storage::{MemoryStorage, SessionStorage, TowerSessionStorage};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use pedalhub_core::{Cart, User};

use crate::models::{CurrentSession, session_keys};

/// Errors raised by session storage.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying store failed.
    #[error("session store error: {0}")]
    Store(String),

    /// A stored value could not be decoded.
    #[error("corrupt session value for '{key}': {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode session value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Typed access to the session: token, user and cart.
#[derive(Debug, Clone)]
pub struct SessionManager<S> {
    storage: S,
}

impl<S: SessionStorage> SessionManager<S> {
    /// Wrap a storage backend.
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the store cannot be read.
    pub async fn token(&self) -> Result<Option<SecretString>, SessionError> {
        Ok(self
            .storage
            .get(session_keys::TOKEN)
            .await?
            .filter(|token| !token.is_empty())
            .map(SecretString::from))
    }

    /// The stored user record, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Corrupt` if the stored value is not a valid user.
    pub async fn user(&self) -> Result<Option<User>, SessionError> {
        match self.storage.get(session_keys::USER).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| SessionError::Corrupt {
                    key: session_keys::USER,
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Token and user together. `None` unless both are present.
    ///
    /// # Errors
    ///
    /// Propagates storage and decoding errors.
    pub async fn current(&self) -> Result<Option<CurrentSession>, SessionError> {
        let Some(token) = self.token().await? else {
            return Ok(None);
        };
        let Some(user) = self.user().await? else {
            return Ok(None);
        };
        Ok(Some(CurrentSession { token, user }))
    }

    /// Whether a complete login is stored. Storage errors read as logged out.
    pub async fn is_logged_in(&self) -> bool {
        matches!(self.current().await, Ok(Some(_)))
    }

    /// Store a fresh login.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if either value cannot be written.
    pub async fn login(&self, token: &SecretString, user: &User) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(user)?;
        self.storage
            .set(session_keys::TOKEN, token.expose_secret().to_string())
            .await?;
        self.storage.set(session_keys::USER, user_json).await?;
        tracing::info!(user_id = %user.id, "session created");
        Ok(())
    }

    /// Remove the token and user. The cart is left alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the store cannot be written.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.storage.remove(session_keys::TOKEN).await?;
        self.storage.remove(session_keys::USER).await?;
        tracing::info!("session cleared");
        Ok(())
    }

    /// The visitor's cart; empty when none has been stored yet.
    ///
    /// A corrupt cart is discarded rather than failing the page.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the store cannot be read.
    pub async fn cart(&self) -> Result<Cart, SessionError> {
        let Some(raw) = self.storage.get(session_keys::CART).await? else {
            return Ok(Cart::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable cart: {e}");
            Cart::new()
        }))
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the cart cannot be written.
    pub async fn save_cart(&self, cart: &Cart) -> Result<(), SessionError> {
        let raw = serde_json::to_string(cart)?;
        self.storage.set(session_keys::CART, raw).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pedalhub_core::{CartLine, Money, ProductId, UserId, UserRole};

    use super::*;

    fn admin() -> User {
        User {
            id: UserId::new("u-1"),
            email: "admin@pedalhub.vn".to_string(),
            name: "Admin".to_string(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn test_empty_session_is_logged_out() {
        let manager = SessionManager::new(MemoryStorage::default());
        assert!(!manager.is_logged_in().await);
        assert!(manager.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_then_read_back() {
        let manager = SessionManager::new(MemoryStorage::default());
        manager
            .login(&SecretString::from("tok-123"), &admin())
            .await
            .unwrap();

        let current = manager.current().await.unwrap().unwrap();
        assert_eq!(current.token.expose_secret(), "tok-123");
        assert_eq!(current.user, admin());
        assert!(manager.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_user() {
        let storage = MemoryStorage::default();
        let manager = SessionManager::new(storage.clone());
        manager
            .login(&SecretString::from("tok-123"), &admin())
            .await
            .unwrap();

        manager.logout().await.unwrap();

        assert!(storage.get(session_keys::TOKEN).await.unwrap().is_none());
        assert!(storage.get(session_keys::USER).await.unwrap().is_none());
        assert!(!manager.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_token_without_user_is_not_a_login() {
        let storage = MemoryStorage::default();
        storage
            .set(session_keys::TOKEN, "orphan".to_string())
            .await
            .unwrap();
        let manager = SessionManager::new(storage);
        assert!(manager.token().await.unwrap().is_some());
        assert!(!manager.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_corrupt_user_is_an_error() {
        let storage = MemoryStorage::default();
        storage
            .set(session_keys::USER, "{not json".to_string())
            .await
            .unwrap();
        let manager = SessionManager::new(storage);
        assert!(matches!(
            manager.user().await,
            Err(SessionError::Corrupt { key: "user", .. })
        ));
    }

    #[tokio::test]
    async fn test_cart_round_trip_and_survives_logout() {
        let manager = SessionManager::new(MemoryStorage::default());
        let mut cart = manager.cart().await.unwrap();
        assert!(cart.is_empty());

        cart.add(CartLine {
            product_id: ProductId::new("p-1"),
            product_name: "Helmet".to_string(),
            unit_price: Money::from_units(900_000),
            quantity: 2,
        });
        manager.save_cart(&cart).await.unwrap();
        manager.logout().await.unwrap();

        assert_eq!(manager.cart().await.unwrap().total_quantity(), 2);
    }
}
