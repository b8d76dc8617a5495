//! Guest cart endpoints.

use reqwest::Method;
use tracing::instrument;

use pedalhub_core::{GuestCheckoutRequest, Order};

use super::{BackendClient, BackendError, SESSION_ID_HEADER};

impl BackendClient {
    /// Place an order for a guest visitor.
    ///
    /// `POST /guest/cart/checkout` with the `x-session-id` header.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the checkout.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn guest_checkout(
        &self,
        session_id: &str,
        request: &GuestCheckoutRequest,
    ) -> Result<Order, BackendError> {
        let builder = self
            .request(Method::POST, "/guest/cart/checkout", None)
            .header(SESSION_ID_HEADER, session_id)
            .json(request);
        self.send(builder).await
    }
}
