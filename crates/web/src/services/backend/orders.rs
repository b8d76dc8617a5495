//! `/orders` endpoints.

use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use pedalhub_core::{
    CreateOrderRequest, Order, OrderId, OrderStats, OrderStatus, UpdateOrderStatusRequest,
};

use super::{BackendClient, BackendError};

impl BackendClient {
    /// List all orders.
    ///
    /// `GET /orders`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the body does not parse.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &SecretString) -> Result<Vec<Order>, BackendError> {
        let builder = self.request(Method::GET, "/orders", Some(token));
        self.send(builder).await
    }

    /// Fetch a single order.
    ///
    /// `GET /orders/{id}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 404 if the order does not exist.
    #[instrument(skip(self, token))]
    pub async fn get_order(
        &self,
        token: &SecretString,
        id: &OrderId,
    ) -> Result<Order, BackendError> {
        let path = format!("/orders/{}", urlencoding::encode(id.as_str()));
        let builder = self.request(Method::GET, &path, Some(token));
        self.send(builder).await
    }

    /// List orders in one status.
    ///
    /// `GET /orders/status/{status}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the body does not parse.
    #[instrument(skip(self, token))]
    pub async fn orders_by_status(
        &self,
        token: &SecretString,
        status: OrderStatus,
    ) -> Result<Vec<Order>, BackendError> {
        let path = format!("/orders/status/{status}");
        let builder = self.request(Method::GET, &path, Some(token));
        self.send(builder).await
    }

    /// Aggregate order figures.
    ///
    /// `GET /orders/stats`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the body does not parse.
    #[instrument(skip(self, token))]
    pub async fn order_stats(&self, token: &SecretString) -> Result<OrderStats, BackendError> {
        let builder = self.request(Method::GET, "/orders/stats", Some(token));
        self.send(builder).await
    }

    /// Create an order.
    ///
    /// `POST /orders`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the order.
    #[instrument(skip(self, token, request))]
    pub async fn create_order(
        &self,
        token: &SecretString,
        request: &CreateOrderRequest,
    ) -> Result<Order, BackendError> {
        let builder = self
            .request(Method::POST, "/orders", Some(token))
            .json(request);
        self.send(builder).await
    }

    /// Move an order to a new status.
    ///
    /// `PATCH /orders/{id}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the transition.
    #[instrument(skip(self, token))]
    pub async fn update_order_status(
        &self,
        token: &SecretString,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, BackendError> {
        let path = format!("/orders/{}", urlencoding::encode(id.as_str()));
        let builder = self
            .request(Method::PATCH, &path, Some(token))
            .json(&UpdateOrderStatusRequest { status });
        self.send(builder).await
    }

    /// Delete an order.
    ///
    /// `DELETE /orders/{id}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend refuses the deletion.
    #[instrument(skip(self, token))]
    pub async fn delete_order(&self, token: &SecretString, id: &OrderId) -> Result<(), BackendError> {
        let path = format!("/orders/{}", urlencoding::encode(id.as_str()));
        let builder = self.request(Method::DELETE, &path, Some(token));
        self.send_empty(builder).await
    }
}
