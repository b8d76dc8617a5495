//! `/auth` endpoints.

use reqwest::Method;
use tracing::instrument;

use pedalhub_core::{LoginRequest, LoginResponse};

use super::{BackendClient, BackendError};

impl BackendClient {
    /// Exchange credentials for an access token and the user record.
    ///
    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with the backend's status (typically 401)
    /// when the credentials are rejected.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        let builder = self.request(Method::POST, "/auth/login", None).json(request);
        self.send(builder).await
    }
}
