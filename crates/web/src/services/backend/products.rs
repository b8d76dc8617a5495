//! `/products` endpoints for the storefront.

use reqwest::Method;
use tracing::instrument;

use pedalhub_core::{Product, ProductId};

use super::{BackendClient, BackendError};

impl BackendClient {
    /// List products.
    ///
    /// `GET /products`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the body does not parse.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let builder = self.request(Method::GET, "/products", None);
        self.send(builder).await
    }

    /// Fetch one product.
    ///
    /// `GET /products/{id}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 404 if the product does not exist.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        let builder = self.request(Method::GET, &path, None);
        self.send(builder).await
    }
}
