//! Login exchange and the current-user record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::status::UserRole;

/// Body for `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Opaque bearer token; never inspected on this side.
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
    pub user: User,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    /// Whether the user may open admin-only pages.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Name for display, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_accepts_snake_case_token() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"access_token": "abc", "user": {"id": 1, "email": "a@b.vn", "role": "admin"}}"#,
        )
        .unwrap();
        assert_eq!(resp.access_token, "abc");
        assert!(resp.user.is_admin());
    }

    #[test]
    fn test_user_role_defaults_to_regular() {
        let user: User = serde_json::from_str(r#"{"id": "u1", "email": "a@b.vn"}"#).unwrap();
        assert!(!user.is_admin());
        assert_eq!(user.display_name(), "a@b.vn");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let req = LoginRequest {
            email: "a@b.vn".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{req:?}").contains("hunter22"));
    }
}
