//! Dashboard route handlers.
//!
//! All routes require a session. Backend failures are shown on the page;
//! a rejected token signs the visitor out.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use pedalhub_core::{Money, Order, OrderId, OrderStatus, PaymentMethod, User};

use super::{backend_failure, with_query};
use crate::filters;
use crate::middleware::RequireSession;
use crate::state::AppState;

/// Number of orders shown on the dashboard home.
const RECENT_ORDERS: usize = 5;

/// Flash-style messages carried in the query string after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Order list filter.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Headline numbers for the dashboard home.
pub struct OrderSummary {
    pub total_orders: usize,
    pub open_orders: usize,
    pub paid_revenue: Money,
}

impl OrderSummary {
    fn from_orders(orders: &[Order]) -> Self {
        Self {
            total_orders: orders.len(),
            open_orders: orders.iter().filter(|o| o.status.is_open()).count(),
            paid_revenue: orders
                .iter()
                .filter(|o| o.is_paid)
                .map(|o| o.total_amount)
                .sum(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub user: User,
    pub summary: Option<OrderSummary>,
    pub recent: Vec<Order>,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard/orders.html")]
pub struct OrdersTemplate {
    pub user: User,
    pub orders: Vec<Order>,
    pub statuses: &'static [OrderStatus],
    pub selected: Option<OrderStatus>,
    pub error: Option<String>,
}

impl OrdersTemplate {
    /// Wire value of the active filter, empty when showing all orders.
    #[must_use]
    pub fn selected_status(&self) -> &'static str {
        self.selected.map_or("", |status| status.as_str())
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard/order.html")]
pub struct OrderTemplate {
    pub user: User,
    pub order_id: OrderId,
    pub order: Option<Order>,
    pub statuses: &'static [OrderStatus],
    pub can_verify: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard/profile.html")]
pub struct ProfileTemplate {
    pub user: User,
}

/// `GET /dashboard`
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Response {
    let (summary, recent, error) = match state.backend().list_orders(&session.token).await {
        Ok(mut orders) => {
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let summary = OrderSummary::from_orders(&orders);
            orders.truncate(RECENT_ORDERS);
            (Some(summary), orders, None)
        }
        Err(e) => match backend_failure(e) {
            Ok(message) => (None, Vec::new(), Some(message)),
            Err(response) => return response,
        },
    };

    DashboardTemplate {
        user: session.user,
        summary,
        recent,
        error,
    }
    .into_response()
}

/// `GET /dashboard/orders?status=`
#[instrument(skip(state, session))]
pub async fn orders(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let filter = query.status.as_deref().filter(|s| !s.is_empty());
    let (selected, mut error) = match filter.map(str::parse::<OrderStatus>) {
        None => (None, None),
        Some(Ok(status)) => (Some(status), None),
        Some(Err(e)) => (None, Some(e)),
    };

    let result = match selected {
        Some(status) => state.backend().orders_by_status(&session.token, status).await,
        None => state.backend().list_orders(&session.token).await,
    };

    let orders = match result {
        Ok(orders) => orders,
        Err(e) => match backend_failure(e) {
            Ok(message) => {
                error = Some(message);
                Vec::new()
            }
            Err(response) => return response,
        },
    };

    OrdersTemplate {
        user: session.user,
        orders,
        statuses: OrderStatus::ALL,
        selected,
        error,
    }
    .into_response()
}

/// `GET /dashboard/orders/{id}`
#[instrument(skip(state, session, notice))]
pub async fn order_detail(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<OrderId>,
    Query(notice): Query<NoticeQuery>,
) -> Response {
    let (order, fetch_error) = match state.backend().get_order(&session.token, &id).await {
        Ok(order) => (Some(order), None),
        Err(e) if e.is_not_found() => (None, Some(format!("Order {id} does not exist."))),
        Err(e) => match backend_failure(e) {
            Ok(message) => (None, Some(message)),
            Err(response) => return response,
        },
    };

    let can_verify = session.user.is_admin()
        && order
            .as_ref()
            .is_some_and(|o| o.payment_method == PaymentMethod::BankTransfer && !o.is_paid);

    OrderTemplate {
        user: session.user,
        order_id: id,
        order,
        statuses: OrderStatus::ALL,
        can_verify,
        notice: notice.notice,
        error: fetch_error.or(notice.error),
    }
    .into_response()
}

/// `POST /dashboard/orders/{id}/status`
#[instrument(skip(state, session))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Response {
    let detail = format!("/dashboard/orders/{}", urlencoding::encode(id.as_str()));

    let status = match form.status.parse::<OrderStatus>() {
        Ok(status) => status,
        Err(e) => return Redirect::to(&with_query(&detail, "error", &e)).into_response(),
    };

    match state
        .backend()
        .update_order_status(&session.token, &id, status)
        .await
    {
        Ok(order) => {
            tracing::info!(order_id = %order.id, %status, "order status updated");
            Redirect::to(&with_query(&detail, "notice", &format!("Status set to {status}.")))
                .into_response()
        }
        Err(e) => match backend_failure(e) {
            Ok(message) => Redirect::to(&with_query(&detail, "error", &message)).into_response(),
            Err(response) => response,
        },
    }
}

/// `POST /dashboard/orders/{id}/delete`
#[instrument(skip(state, session))]
pub async fn delete_order(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<OrderId>,
) -> Response {
    match state.backend().delete_order(&session.token, &id).await {
        Ok(()) => {
            tracing::info!(order_id = %id, "order deleted");
            Redirect::to("/dashboard/orders").into_response()
        }
        Err(e) => match backend_failure(e) {
            Ok(message) => {
                let detail = format!("/dashboard/orders/{}", urlencoding::encode(id.as_str()));
                Redirect::to(&with_query(&detail, "error", &message)).into_response()
            }
            Err(response) => response,
        },
    }
}

/// `GET /dashboard/profile`
pub async fn profile(RequireSession(session): RequireSession) -> impl IntoResponse {
    ProfileTemplate { user: session.user }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(id: &str, status: &str, paid: bool, total: i64) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "orderNumber": format!("PH-{id}"),
            "customerId": "c-1",
            "customerName": "Lan",
            "totalAmount": total,
            "status": status,
            "shippingAddress": "12 Tran Hung Dao, Ha Noi",
            "paymentMethod": "cod",
            "isPaid": paid,
            "items": [],
            "createdAt": "2025-03-01T08:00:00Z",
            "updatedAt": "2025-03-01T08:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_counts_open_orders_and_paid_revenue() {
        let orders = vec![
            order("1", "pending", false, 100),
            order("2", "delivered", true, 250),
            order("3", "shipped", true, 50),
            order("4", "cancelled", false, 999),
        ];
        let summary = OrderSummary::from_orders(&orders);

        assert_eq!(summary.total_orders, 4);
        assert_eq!(summary.open_orders, 2);
        assert_eq!(summary.paid_revenue, Money::from_units(300));
    }
}
