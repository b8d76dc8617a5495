//! Admin-only route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use pedalhub_core::{Money, OrderId, OrderStats, OrderStatus, PaymentId, User};

use super::{backend_failure, with_query};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// One row of the per-status breakdown.
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/metrics.html")]
pub struct MetricsTemplate {
    pub user: User,
    pub total_orders: u64,
    pub total_revenue: Money,
    pub by_status: Vec<StatusCount>,
    pub error: Option<String>,
}

/// Bank transfer verification form.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
}

fn status_breakdown(stats: &OrderStats) -> Vec<StatusCount> {
    OrderStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: stats.count(status),
        })
        .collect()
}

/// `GET /admin/metrics`
#[instrument(skip_all)]
pub async fn metrics(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
) -> Response {
    match state.backend().order_stats(&session.token).await {
        Ok(stats) => MetricsTemplate {
            user: session.user,
            total_orders: stats.total_orders,
            total_revenue: stats.total_revenue,
            by_status: status_breakdown(&stats),
            error: None,
        }
        .into_response(),
        Err(e) => match backend_failure(e) {
            Ok(message) => MetricsTemplate {
                user: session.user,
                total_orders: 0,
                total_revenue: Money::ZERO,
                by_status: Vec::new(),
                error: Some(message),
            }
            .into_response(),
            Err(response) => response,
        },
    }
}

/// `POST /admin/payments/verify`
///
/// Marks a bank transfer as received, then returns to the order page.
#[instrument(skip(state, session))]
pub async fn verify_payment(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Form(form): Form<VerifyForm>,
) -> Response {
    if form.payment_id.as_str().trim().is_empty() {
        return AppError::BadRequest("payment_id is required".to_string()).into_response();
    }

    let detail = format!(
        "/dashboard/orders/{}",
        urlencoding::encode(form.order_id.as_str())
    );

    match state
        .backend()
        .verify_bank_transfer(&session.token, &form.payment_id)
        .await
    {
        Ok(payment) => {
            tracing::info!(
                payment_id = %payment.id,
                order_id = %payment.order_id,
                status = %payment.status,
                "bank transfer verified"
            );
            let notice = format!("Payment {} is now {}.", payment.id, payment.status);
            Redirect::to(&with_query(&detail, "notice", &notice)).into_response()
        }
        Err(e) => match backend_failure(e) {
            Ok(message) => Redirect::to(&with_query(&detail, "error", &message)).into_response(),
            Err(response) => response,
        },
    }
}
