//! `/payment` endpoints for bank transfer and credit card flows.

use reqwest::Method;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::instrument;

use pedalhub_core::{
    BankTransferRequest, BankTransferResponse, CreditCardRequest, CreditCardResponse, OrderId,
    PaymentId, QrCodeResponse,
};

use super::{BackendClient, BackendError};

impl BackendClient {
    /// Request a bank-transfer QR code for an order and amount.
    ///
    /// `GET /payment/bank-transfer/qr/{orderId}?amount=`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the body does not parse.
    #[instrument(skip(self))]
    pub async fn bank_transfer_qr(
        &self,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<QrCodeResponse, BackendError> {
        let path = format!(
            "/payment/bank-transfer/qr/{}?amount={}",
            urlencoding::encode(order_id.as_str()),
            amount.normalize()
        );
        let builder = self.request(Method::GET, &path, None);
        self.send(builder).await
    }

    /// Submit bank-transfer details for an order.
    ///
    /// `POST /payment/bank-transfer/{orderId}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the transfer.
    #[instrument(skip(self, request))]
    pub async fn submit_bank_transfer(
        &self,
        order_id: &OrderId,
        request: &BankTransferRequest,
    ) -> Result<BankTransferResponse, BackendError> {
        let path = format!(
            "/payment/bank-transfer/{}",
            urlencoding::encode(order_id.as_str())
        );
        let builder = self.request(Method::POST, &path, None).json(request);
        self.send(builder).await
    }

    /// Mark a bank transfer as verified (admin only on the backend).
    ///
    /// `PATCH /payment/bank-transfer/verify/{paymentId}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the verification.
    #[instrument(skip(self, token))]
    pub async fn verify_bank_transfer(
        &self,
        token: &SecretString,
        payment_id: &PaymentId,
    ) -> Result<BankTransferResponse, BackendError> {
        let path = format!(
            "/payment/bank-transfer/verify/{}",
            urlencoding::encode(payment_id.as_str())
        );
        let builder = self.request(Method::PATCH, &path, Some(token));
        self.send(builder).await
    }

    /// Submit a credit card payment for an order.
    ///
    /// `POST /payment/credit-card/{orderId}`
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend declines the payment.
    #[instrument(skip(self, request), fields(card = %request.masked_number()))]
    pub async fn submit_credit_card(
        &self,
        order_id: &OrderId,
        request: &CreditCardRequest,
    ) -> Result<CreditCardResponse, BackendError> {
        let path = format!(
            "/payment/credit-card/{}",
            urlencoding::encode(order_id.as_str())
        );
        let builder = self.request(Method::POST, &path, None).json(request);
        self.send(builder).await
    }
}
