//! Payment pages for bank transfer and credit card.
//!
//! Opening a page never calls the backend. The QR code is requested only
//! when the shopper asks for it, and its countdown is cosmetic: reaching
//! zero does not invalidate or refresh the code.
//!
//! # Routes
//!
//! ```text
//! GET  /store/payment/bank-transfer/{order_id}?amount=   - transfer page
//! POST /store/payment/bank-transfer/{order_id}/qr        - request QR code
//! GET  /store/payment/bank-transfer/{order_id}/countdown - SSE, one event per second
//! POST /store/payment/bank-transfer/{order_id}           - submit transfer details
//! GET  /store/payment/credit-card/{order_id}?amount=     - card page
//! POST /store/payment/credit-card/{order_id}             - submit card payment
//! ```

use std::convert::Infallible;
use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use base64::{Engine, engine::general_purpose::STANDARD};
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use pedalhub_core::{
    BankTransferRequest, BankTransferResponse, CreditCardRequest, CreditCardResponse, OrderId,
    QR_VALIDITY_SECS, QrCountdown,
};

use crate::countdown::{TICK, countdown_stream};
use crate::filters;
use crate::state::AppState;

/// `?amount=` on the payment pages.
#[derive(Debug, Deserialize)]
pub struct AmountQuery {
    pub amount: Option<String>,
}

/// QR request form; the amount travels as a hidden field.
#[derive(Debug, Deserialize)]
pub struct QrForm {
    pub amount: String,
}

/// Bank transfer details form.
#[derive(Debug, Deserialize)]
pub struct BankTransferForm {
    pub bank_name: String,
    pub account_number: String,
    pub transfer_amount: String,
    pub proof_url: Option<String>,
}

/// Credit card form.
#[derive(Deserialize)]
pub struct CreditCardForm {
    pub card_number: String,
    pub card_holder_name: String,
    pub expiry_date: String,
    pub cvv: String,
    pub amount: String,
}

/// A rendered QR code.
pub struct QrView {
    /// `data:` URI for the `<img>` tag.
    pub image_src: String,
    pub remaining: u32,
    pub countdown_url: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "payment/bank_transfer.html")]
pub struct BankTransferTemplate {
    pub order_id: OrderId,
    pub amount: Option<Decimal>,
    pub qr: Option<QrView>,
    pub result: Option<BankTransferResponse>,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "payment/credit_card.html")]
pub struct CreditCardTemplate {
    pub order_id: OrderId,
    pub amount: Option<Decimal>,
    pub result: Option<CreditCardResponse>,
    pub error: Option<String>,
}

/// Parse a positive amount.
fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| format!("'{}' is not a valid amount.", raw.trim()))?;
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero.".to_string());
    }
    Ok(amount)
}

/// Amount from the query string. Absent or invalid amounts render the page
/// without one, plus a message for the invalid case.
fn query_amount(query: &AmountQuery) -> (Option<Decimal>, Option<String>) {
    match query.amount.as_deref().filter(|raw| !raw.trim().is_empty()) {
        None => (None, None),
        Some(raw) => match parse_amount(raw) {
            Ok(amount) => (Some(amount), None),
            Err(message) => (None, Some(message)),
        },
    }
}

/// `data:` URI for a QR payload, or `None` when the payload is not base64.
fn qr_image_src(payload: &str) -> Option<String> {
    STANDARD
        .decode(payload)
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .map(|_| format!("data:image/png;base64,{payload}"))
}

fn countdown_url(order_id: &OrderId) -> String {
    format!(
        "/store/payment/bank-transfer/{}/countdown",
        urlencoding::encode(order_id.as_str())
    )
}

/// `MM/YY` with a real month.
fn valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.trim().split_once('/') else {
        return false;
    };
    let month_ok = month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m));
    let year_ok = year.len() == 2 && year.chars().all(|c| c.is_ascii_digit());
    month_ok && year_ok
}

impl CreditCardForm {
    fn to_request(&self) -> Result<CreditCardRequest, String> {
        let card_number: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if !(12..=19).contains(&card_number.len()) || !card_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err("Card number must be 12 to 19 digits.".to_string());
        }
        if self.card_holder_name.trim().is_empty() {
            return Err("Card holder name is required.".to_string());
        }
        if !valid_expiry(&self.expiry_date) {
            return Err("Expiry date must be MM/YY.".to_string());
        }
        let cvv = self.cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err("CVV must be 3 or 4 digits.".to_string());
        }

        Ok(CreditCardRequest {
            card_number,
            card_holder_name: self.card_holder_name.trim().to_string(),
            expiry_date: self.expiry_date.trim().to_string(),
            cvv: cvv.to_string(),
            amount: parse_amount(&self.amount)?,
        })
    }
}

// =============================================================================
// Bank transfer
// =============================================================================

/// `GET /store/payment/bank-transfer/{order_id}?amount=`
pub async fn bank_transfer_page(
    Path(order_id): Path<OrderId>,
    Query(query): Query<AmountQuery>,
) -> impl IntoResponse {
    let (amount, error) = query_amount(&query);
    BankTransferTemplate {
        order_id,
        amount,
        qr: None,
        result: None,
        error,
    }
}

/// `POST /store/payment/bank-transfer/{order_id}/qr`
#[instrument(skip(state))]
pub async fn bank_transfer_qr(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Form(form): Form<QrForm>,
) -> Response {
    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(message) => {
            let page = BankTransferTemplate {
                order_id,
                amount: None,
                qr: None,
                result: None,
                error: Some(message),
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let (qr, error) = match state.backend().bank_transfer_qr(&order_id, amount).await {
        Ok(qr) => match qr_image_src(qr.base64_payload()) {
            Some(image_src) => {
                let view = QrView {
                    image_src,
                    remaining: QR_VALIDITY_SECS,
                    countdown_url: countdown_url(&order_id),
                };
                (Some(view), None)
            }
            None => {
                tracing::warn!(%order_id, "QR code payload is not base64");
                (None, Some("The QR code could not be displayed. Please try again.".to_string()))
            }
        },
        Err(e) => {
            tracing::warn!("QR code request failed: {e}");
            (None, Some(e.user_message()))
        }
    };

    BankTransferTemplate {
        order_id,
        amount: Some(amount),
        qr,
        result: None,
        error,
    }
    .into_response()
}

/// `GET /store/payment/bank-transfer/{order_id}/countdown`
///
/// Server-sent events: `tick` with the remaining seconds once per second,
/// starting at 900 and ending after 0.
pub async fn bank_transfer_countdown(
    Path(order_id): Path<OrderId>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(%order_id, "QR countdown started");
    let events = countdown_stream(QrCountdown::start(), TICK).map(|remaining| {
        Ok(Event::default()
            .event("tick")
            .data(remaining.to_string()))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// `POST /store/payment/bank-transfer/{order_id}`
#[instrument(skip(state, form))]
pub async fn bank_transfer_submit(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Form(form): Form<BankTransferForm>,
) -> Response {
    let render = |amount, result, error| BankTransferTemplate {
        order_id: order_id.clone(),
        amount,
        qr: None,
        result,
        error,
    };

    if form.bank_name.trim().is_empty() || form.account_number.trim().is_empty() {
        let page = render(
            None,
            None,
            Some("Bank name and account number are required.".to_string()),
        );
        return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
    }
    let transfer_amount = match parse_amount(&form.transfer_amount) {
        Ok(amount) => amount,
        Err(message) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, render(None, None, Some(message)))
                .into_response();
        }
    };

    let request = BankTransferRequest {
        bank_name: form.bank_name.trim().to_string(),
        account_number: form.account_number.trim().to_string(),
        transfer_amount,
        proof_url: form
            .proof_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty()),
    };

    match state.backend().submit_bank_transfer(&order_id, &request).await {
        Ok(result) => {
            tracing::info!(payment_id = %result.id, status = %result.status, "bank transfer submitted");
            render(Some(transfer_amount), Some(result), None).into_response()
        }
        Err(e) => {
            tracing::warn!("Bank transfer submission failed: {e}");
            render(Some(transfer_amount), None, Some(e.user_message())).into_response()
        }
    }
}

// =============================================================================
// Credit card
// =============================================================================

/// `GET /store/payment/credit-card/{order_id}?amount=`
pub async fn credit_card_page(
    Path(order_id): Path<OrderId>,
    Query(query): Query<AmountQuery>,
) -> impl IntoResponse {
    let (amount, error) = query_amount(&query);
    CreditCardTemplate {
        order_id,
        amount,
        result: None,
        error,
    }
}

/// `POST /store/payment/credit-card/{order_id}`
///
/// Submitted once; the page shows the resulting status without the form.
#[instrument(skip(state, form))]
pub async fn credit_card_submit(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Form(form): Form<CreditCardForm>,
) -> Response {
    let request = match form.to_request() {
        Ok(request) => request,
        Err(message) => {
            let page = CreditCardTemplate {
                order_id,
                amount: parse_amount(&form.amount).ok(),
                result: None,
                error: Some(message),
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let amount = Some(request.amount);
    match state.backend().submit_credit_card(&order_id, &request).await {
        Ok(result) => {
            tracing::info!(payment_id = %result.id, status = %result.status, "card payment submitted");
            CreditCardTemplate {
                order_id,
                amount,
                result: Some(result),
                error: None,
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(card = %request.masked_number(), "Card payment failed: {e}");
            CreditCardTemplate {
                order_id,
                amount,
                result: None,
                error: Some(e.user_message()),
            }
            .into_response()
        }
    }
}
