//! Prepaid-credit billing: Lightning top-up invoices and balance lookups.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{endpoint, http_client, normalize_base_url};
use crate::error::{CollaboratorError, CoreError, Result};
use crate::storage::BillingConfig;

pub const MIN_TOPUP_SATS: u32 = 100;
pub const MAX_TOPUP_SATS: u32 = 1000;

/// Amount actually requested: missing or zero means the maximum, anything
/// else is clamped into range.
pub fn clamp_topup_amount(amount: Option<u32>) -> u32 {
    match amount {
        Some(n) if n > 0 => n.clamp(MIN_TOPUP_SATS, MAX_TOPUP_SATS),
        _ => MAX_TOPUP_SATS,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: String,
    pub amount: u64,
    pub currency: String,
    pub lightning_invoice: String,
    pub checkout_url: String,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Invoice {
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceState {
    New,
    Processing,
    Settled,
    Expired,
}

impl InvoiceState {
    /// No further transitions are expected.
    pub fn is_final(&self) -> bool {
        matches!(self, InvoiceState::Settled | InvoiceState::Expired)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceStatus {
    pub invoice_id: String,
    pub status: InvoiceState,
    pub amount: u64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: f64,
}

#[derive(Debug, Clone)]
pub struct BillingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BillingClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client(),
            base_url: normalize_base_url(base_url)?,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &BillingConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::new(&config.base_url, api_key)
    }

    pub async fn create_invoice(&self, amount: Option<u32>) -> Result<Invoice> {
        const OP: &str = "create invoice";
        let amount = clamp_topup_amount(amount);
        let request = self
            .http
            .post(endpoint(&self.base_url, "topup/create/btc-lightning"))
            .json(&json!({ "amount": amount, "currency": "SATS" }));
        let invoice: Invoice = self.send_json(OP, request).await?;
        debug!(invoice_id = %invoice.invoice_id, amount = invoice.amount, "invoice created");
        Ok(invoice)
    }

    pub async fn invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus> {
        const OP: &str = "get status";
        let path = format!("topup/status/{}", urlencoding::encode(invoice_id));
        let request = self.http.get(endpoint(&self.base_url, &path));
        self.send_json(OP, request).await
    }

    pub async fn balance(&self) -> Result<f64> {
        const OP: &str = "get balance";
        let request = self.http.post(endpoint(&self.base_url, "credits/balance"));
        let response: BalanceResponse = self.send_json(OP, request).await?;
        Ok(response.balance)
    }

    /// Poll an invoice until it settles or expires, or `max_polls` checks
    /// have been made. Returns the last status seen.
    pub async fn wait_for_settlement(
        &self,
        invoice_id: &str,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<InvoiceStatus> {
        let max_polls = max_polls.max(1);
        let mut polls = 0;
        loop {
            let status = self.invoice_status(invoice_id).await?;
            polls += 1;
            if status.status.is_final() || polls >= max_polls {
                return Ok(status);
            }
            debug!(?status.status, polls, "invoice not final yet");
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn send_json<T>(&self, operation: &'static str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|_| unavailable(operation, None))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(operation, Some(status.as_u16())));
        }
        response
            .json::<T>()
            .await
            .map_err(|_| unavailable(operation, Some(status.as_u16())))
    }
}

fn unavailable(operation: &'static str, status: Option<u16>) -> CoreError {
    warn!(operation, status, "billing request failed");
    CollaboratorError::BillingUnavailable { operation }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn amount_is_clamped() {
        assert_eq!(clamp_topup_amount(None), 1000);
        assert_eq!(clamp_topup_amount(Some(0)), 1000);
        assert_eq!(clamp_topup_amount(Some(5)), 100);
        assert_eq!(clamp_topup_amount(Some(500)), 500);
        assert_eq!(clamp_topup_amount(Some(50_000)), 1000);
    }

    #[test]
    fn final_states() {
        assert!(!InvoiceState::New.is_final());
        assert!(!InvoiceState::Processing.is_final());
        assert!(InvoiceState::Settled.is_final());
        assert!(InvoiceState::Expired.is_final());
    }

    #[tokio::test]
    async fn create_invoice_sends_clamped_amount() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/topup/create/btc-lightning")
            .match_header("authorization", "Bearer key")
            .match_body(Matcher::Json(json!({ "amount": 100, "currency": "SATS" })))
            .with_status(200)
            .with_body(
                json!({
                    "invoice_id": "inv_1",
                    "amount": 100,
                    "currency": "SATS",
                    "lightning_invoice": "lnbc1...",
                    "checkout_url": "https://pay.example/inv_1",
                    "expires_at": 1_700_000_000
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "key").unwrap();
        let invoice = client.create_invoice(Some(10)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(invoice.invoice_id, "inv_1");
        assert_eq!(invoice.amount, 100);
        assert!(invoice.expires_at_utc().is_some());
    }

    #[tokio::test]
    async fn status_failure_is_generic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/topup/status/inv_missing")
            .with_status(404)
            .with_body(r#"{"message":"no such invoice"}"#)
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "key").unwrap();
        let err = client.invoice_status("inv_missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get status");
    }

    #[tokio::test]
    async fn balance_is_read() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/credits/balance")
            .with_status(200)
            .with_body(r#"{"balance": 1.2345}"#)
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "key").unwrap();
        assert_eq!(client.balance().await.unwrap(), 1.2345);
    }

    #[tokio::test]
    async fn wait_stops_on_settled() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/topup/status/inv_2")
            .with_status(200)
            .with_body(
                json!({
                    "invoice_id": "inv_2",
                    "status": "Settled",
                    "amount": 200,
                    "currency": "SATS"
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "key").unwrap();
        let status = client
            .wait_for_settlement("inv_2", Duration::from_millis(10), 5)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(status.status, InvoiceState::Settled);
    }

    #[tokio::test]
    async fn wait_gives_up_after_max_polls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/topup/status/inv_3")
            .with_status(200)
            .with_body(
                json!({
                    "invoice_id": "inv_3",
                    "status": "New",
                    "amount": 200,
                    "currency": "SATS"
                })
                .to_string(),
            )
            .expect(3)
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "key").unwrap();
        let status = client
            .wait_for_settlement("inv_3", Duration::from_millis(1), 3)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(status.status, InvoiceState::New);
    }
}
