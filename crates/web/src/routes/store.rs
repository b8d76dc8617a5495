//! Storefront route handlers.
//!
//! Public: the route guard always lets `/store` through. The cart lives in
//! the visitor's session; checkout submits it to the backend as a guest
//! order, keyed by the session id.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use pedalhub_core::{
    Cart, CartLine, GuestCheckoutRequest, Money, Order, OrderId, PaymentMethod, Product,
    ProductId,
};

use super::with_query;
use crate::error::{AppError, TokenRejected, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalSession, WebSession};
use crate::state::AppState;

/// Largest quantity accepted for a single cart line.
const MAX_LINE_QUANTITY: u32 = 99;

/// Product display data for templates.
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image: String,
    pub in_stock: bool,
}

impl ProductCard {
    fn new(product: Product, state: &AppState) -> Self {
        Self {
            image: state.image_src(product.image_url.as_deref()),
            in_stock: product.in_stock(),
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
        }
    }
}

/// Message carried in the query string after a cart redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Guest checkout form.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
    pub payment_method: String,
}

impl CheckoutForm {
    /// Validate and turn the form plus cart into a backend request.
    fn to_request(&self, cart: &Cart) -> Result<GuestCheckoutRequest, String> {
        let required = [
            ("Name", &self.customer_name),
            ("Email", &self.email),
            ("Phone", &self.phone),
            ("Shipping address", &self.shipping_address),
        ];
        if let Some((label, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(format!("{label} is required."));
        }
        if !self.email.contains('@') {
            return Err("Email address looks invalid.".to_string());
        }
        if cart.is_empty() {
            return Err("Your cart is empty.".to_string());
        }
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| "Choose a payment method.".to_string())?;

        Ok(GuestCheckoutRequest {
            customer_name: self.customer_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            shipping_address: self.shipping_address.trim().to_string(),
            payment_method,
            items: cart.to_checkout_items(),
        })
    }
}

/// Where to send the shopper once the order exists.
fn next_step(order: &Order) -> String {
    let id = urlencoding::encode(order.id.as_str());
    let amount = order.total_amount.amount().normalize();
    match order.payment_method {
        PaymentMethod::BankTransfer => {
            format!("/store/payment/bank-transfer/{id}?amount={amount}")
        }
        PaymentMethod::CreditCard => format!("/store/payment/credit-card/{id}?amount={amount}"),
        PaymentMethod::Cod => format!("/store/orders/{id}/confirmation"),
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "store/index.html")]
pub struct StoreIndexTemplate {
    pub products: Vec<ProductCard>,
    pub cart_count: u32,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/product.html")]
pub struct ProductTemplate {
    pub product: ProductCard,
    pub cart_count: u32,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/cart.html")]
pub struct CartTemplate {
    pub cart: Cart,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/checkout.html")]
pub struct CheckoutTemplate {
    pub cart: Cart,
    pub form: CheckoutForm,
    pub methods: &'static [PaymentMethod],
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order_id: OrderId,
    pub order: Option<Order>,
}

/// Cart for the current visitor; store failures read as an empty cart.
async fn load_cart(session: &WebSession) -> Cart {
    session.cart().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to read cart: {e}");
        Cart::new()
    })
}

/// `GET /store`
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, session: WebSession) -> Response {
    let cart_count = load_cart(&session).await.total_quantity();
    let (products, error) = match state.backend().list_products().await {
        Ok(products) => (
            products
                .into_iter()
                .map(|p| ProductCard::new(p, &state))
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!("Failed to list products: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };

    StoreIndexTemplate {
        products,
        cart_count,
        error,
    }
    .into_response()
}

/// `GET /store/products/{id}`
#[instrument(skip(state, session))]
pub async fn product(
    State(state): State<AppState>,
    session: WebSession,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let cart_count = load_cart(&session).await.total_quantity();
    let product = match state.backend().get_product(&id).await {
        Ok(product) => product,
        Err(e) if e.is_not_found() => return Err(AppError::NotFound(format!("product {id}"))),
        Err(e) => {
            tracing::warn!("Failed to load product: {e}");
            let page = StoreIndexTemplate {
                products: Vec::new(),
                cart_count,
                error: Some(e.user_message()),
            };
            return Ok((StatusCode::BAD_GATEWAY, page).into_response());
        }
    };

    Ok(ProductTemplate {
        product: ProductCard::new(product, &state),
        cart_count,
    }
    .into_response())
}

/// `GET /store/cart`
pub async fn cart(session: WebSession, Query(query): Query<CartQuery>) -> impl IntoResponse {
    CartTemplate {
        cart: load_cart(&session).await,
        error: query.error,
    }
}

/// `POST /store/cart/add`
///
/// Name and price come from the backend, not the form.
#[instrument(skip(state, session))]
pub async fn cart_add(
    State(state): State<AppState>,
    session: WebSession,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let quantity = form.quantity.unwrap_or(1).clamp(1, MAX_LINE_QUANTITY);

    let product = match state.backend().get_product(&form.product_id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!("Add to cart failed to load product: {e}");
            return Ok(
                Redirect::to(&with_query("/store/cart", "error", &e.user_message()))
                    .into_response(),
            );
        }
    };
    if !product.in_stock() {
        let message = format!("{} is out of stock.", product.name);
        return Ok(Redirect::to(&with_query("/store/cart", "error", &message)).into_response());
    }

    let mut cart = session.cart().await?;
    cart.add(CartLine {
        product_id: product.id,
        product_name: product.name,
        unit_price: product.price,
        quantity,
    });
    session.save_cart(&cart).await?;
    add_breadcrumb("cart", "Added to cart", &[("product_id", form.product_id.as_str())]);

    Ok(Redirect::to("/store/cart").into_response())
}

/// `POST /store/cart/update`
#[instrument(skip(session))]
pub async fn cart_update(
    session: WebSession,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect, AppError> {
    let mut cart = session.cart().await?;
    if cart.set_quantity(&form.product_id, form.quantity.min(MAX_LINE_QUANTITY)) {
        session.save_cart(&cart).await?;
    }
    Ok(Redirect::to("/store/cart"))
}

/// `POST /store/cart/remove`
#[instrument(skip(session))]
pub async fn cart_remove(
    session: WebSession,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect, AppError> {
    let mut cart = session.cart().await?;
    if cart.remove(&form.product_id) {
        session.save_cart(&cart).await?;
    }
    Ok(Redirect::to("/store/cart"))
}

/// `GET /store/cart/count`
pub async fn cart_count(session: WebSession) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.total_quantity(),
    }
}

/// `GET /store/checkout`
pub async fn checkout_page(session: WebSession) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Redirect::to("/store/cart").into_response();
    }

    CheckoutTemplate {
        cart,
        form: CheckoutForm {
            payment_method: PaymentMethod::Cod.as_str().to_string(),
            ..CheckoutForm::default()
        },
        methods: PaymentMethod::ALL,
        error: None,
    }
    .into_response()
}

/// `POST /store/checkout`
#[instrument(skip(state, session, form), fields(payment_method = %form.payment_method))]
pub async fn checkout(
    State(state): State<AppState>,
    session: WebSession,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let mut cart = session.cart().await?;
    let request = match form.to_request(&cart) {
        Ok(request) => request,
        Err(message) => {
            let page = CheckoutTemplate {
                cart,
                form,
                methods: PaymentMethod::ALL,
                error: Some(message),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let session_id = session.storage().ensure_saved().await?;
    let order = match state.backend().guest_checkout(&session_id, &request).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!("Guest checkout failed: {e}");
            let status = e
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let page = CheckoutTemplate {
                cart,
                form,
                methods: PaymentMethod::ALL,
                error: Some(e.user_message()),
            };
            return Ok((status, page).into_response());
        }
    };

    tracing::info!(order_id = %order.id, total = %order.total_amount, "guest order placed");
    add_breadcrumb("checkout", "Order placed", &[("order_id", order.id.as_str())]);

    cart.clear();
    session.save_cart(&cart).await?;

    Ok(Redirect::to(&next_step(&order)).into_response())
}

/// `GET /store/orders/{id}/confirmation`
///
/// Signed-in visitors also see the order details.
#[instrument(skip(state, session))]
pub async fn confirmation(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Path(id): Path<OrderId>,
) -> Response {
    let mut token_rejected = false;
    let order = match session {
        Some(session) => match state.backend().get_order(&session.token, &id).await {
            Ok(order) => Some(order),
            Err(e) => {
                // Storefront pages stay reachable: sign out, but still confirm.
                token_rejected = e.status() == Some(401);
                tracing::warn!("Confirmation without order details: {e}");
                None
            }
        },
        None => None,
    };

    let mut response = ConfirmationTemplate {
        order_id: id,
        order,
    }
    .into_response();
    if token_rejected {
        response.extensions_mut().insert(TokenRejected);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: "Nguyen Van A".to_string(),
            email: "a@example.com".to_string(),
            phone: "0901234567".to_string(),
            shipping_address: "1 Le Loi, Da Nang".to_string(),
            payment_method: "bank_transfer".to_string(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartLine {
            product_id: ProductId::new("p-1"),
            product_name: "Road bike".to_string(),
            unit_price: Money::from_units(12_000_000),
            quantity: 1,
        });
        cart
    }

    #[test]
    fn test_checkout_form_builds_request() {
        let request = form().to_request(&cart()).unwrap();
        assert_eq!(request.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 1);
    }

    #[test]
    fn test_checkout_form_rejects_missing_fields_and_empty_cart() {
        let mut missing_phone = form();
        missing_phone.phone = "  ".to_string();
        assert_eq!(
            missing_phone.to_request(&cart()).unwrap_err(),
            "Phone is required."
        );

        assert_eq!(
            form().to_request(&Cart::new()).unwrap_err(),
            "Your cart is empty."
        );

        let mut bad_method = form();
        bad_method.payment_method = "barter".to_string();
        assert!(bad_method.to_request(&cart()).is_err());
    }

    #[test]
    fn test_next_step_follows_payment_method() {
        let mut order: Order = serde_json::from_value(serde_json::json!({
            "id": "o-7",
            "orderNumber": "PH-7",
            "customerId": null,
            "totalAmount": "1500000.00",
            "status": "pending",
            "paymentMethod": "bank_transfer",
            "createdAt": "2025-03-01T08:00:00Z",
            "updatedAt": "2025-03-01T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            next_step(&order),
            "/store/payment/bank-transfer/o-7?amount=1500000"
        );

        order.payment_method = PaymentMethod::CreditCard;
        assert_eq!(
            next_step(&order),
            "/store/payment/credit-card/o-7?amount=1500000"
        );

        order.payment_method = PaymentMethod::Cod;
        assert_eq!(next_step(&order), "/store/orders/o-7/confirmation");
    }
}
