//! Payment provider HTTP client
//!
//! Speaks the provider's invoice REST API:
//! - `POST {api_url}/invoice` creates a hosted invoice
//! - `GET {api_url}/invoice/{id}` reports its current status
//!
//! Authentication is a static `x-api-key` header. Response field names vary
//! between provider versions, so invoice extraction is tolerant of the known
//! aliases.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{PaymentError, PaymentResult};
use crate::DEFAULT_TIMEOUT_SECS;

/// Provider connection settings
#[derive(Clone)]
pub struct ProviderConfig {
    /// Base API URL, e.g. `https://api.nowpayments.io/v1`
    pub api_url: String,
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never reveal the API key
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Parameters for creating an invoice
#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoice {
    pub price_amount: f64,
    pub price_currency: String,
    pub order_id: String,
    /// Page the provider redirects to after payment
    pub success_url: Option<String>,
    /// Webhook for provider-side payment notifications
    pub ipn_callback_url: Option<String>,
}

/// A created invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: String,
    pub payment_url: String,
    pub order_id: String,
}

/// Payment provider client
#[derive(Debug, Clone)]
pub struct PaymentProvider {
    client: Client,
    config: ProviderConfig,
}

impl PaymentProvider {
    /// Create a client for the given provider settings
    pub fn new(config: ProviderConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a new hosted invoice
    pub async fn create_invoice(&self, request: &CreateInvoice) -> PaymentResult<Invoice> {
        let url = format!("{}/invoice", self.config.api_url);
        let mut body = json!({
            "price_amount": request.price_amount,
            "price_currency": request.price_currency,
            "order_id": request.order_id,
            "pay_currency": "any",
        });
        if let Some(success_url) = &request.success_url {
            body["success_url"] = json!(success_url);
        }
        if let Some(ipn) = &request.ipn_callback_url {
            body["ipn_callback_url"] = json!(ipn);
        }

        debug!("Creating invoice for order {}", request.order_id);

        let response = self.request(self.client.post(&url).json(&body)).await?;
        parse_invoice(&response, &request.order_id)
    }

    /// Look up the current status string of an invoice, lowercased
    pub async fn invoice_status(&self, invoice_id: &str) -> PaymentResult<String> {
        if !valid_invoice_id(invoice_id) {
            return Err(PaymentError::InvalidInvoiceId);
        }

        let url = format!("{}/invoice/{}", self.config.api_url, invoice_id);

        debug!("Checking status of invoice {}", invoice_id);

        let response = self.request(self.client.get(&url)).await?;

        response["status"]
            .as_str()
            .map(|s| s.to_lowercase())
            .ok_or_else(|| PaymentError::UnexpectedResponse("missing status field".into()))
    }

    /// Send a request with auth, map transport and API-level failures
    async fn request(&self, builder: reqwest::RequestBuilder) -> PaymentResult<Value> {
        let response = builder
            .header("x-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| PaymentError::Network(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::UnexpectedResponse(format!("invalid JSON: {}", e)))
    }
}

/// Invoice ids are interpolated into the request path, so only characters
/// that cannot alter the request target are allowed.
fn valid_invoice_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract an [`Invoice`] from a provider response.
///
/// Different provider versions name the invoice id and hosted-page URL
/// differently; accept the known aliases.
fn parse_invoice(response: &Value, order_id: &str) -> PaymentResult<Invoice> {
    let invoice_id = ["id", "invoice_id"]
        .iter()
        .find_map(|key| field_as_string(&response[*key]));

    let payment_url = ["invoice_url", "url", "checkout_url", "payment_url"]
        .iter()
        .find_map(|key| field_as_string(&response[*key]));

    match (invoice_id, payment_url) {
        (Some(invoice_id), Some(payment_url)) => Ok(Invoice {
            invoice_id,
            payment_url,
            order_id: order_id.to_string(),
        }),
        _ => Err(PaymentError::UnexpectedResponse(
            "response missing invoice id or payment url".into(),
        )),
    }
}

/// Providers return ids as either strings or numbers
fn field_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invoice_standard_fields() {
        let response = json!({
            "id": "12345",
            "invoice_url": "https://pay.example/i/12345",
        });

        let invoice = parse_invoice(&response, "order-1").unwrap();
        assert_eq!(invoice.invoice_id, "12345");
        assert_eq!(invoice.payment_url, "https://pay.example/i/12345");
        assert_eq!(invoice.order_id, "order-1");
    }

    #[test]
    fn test_parse_invoice_alias_fields() {
        let response = json!({
            "invoice_id": 987,
            "checkout_url": "https://pay.example/c/987",
        });

        let invoice = parse_invoice(&response, "order-2").unwrap();
        assert_eq!(invoice.invoice_id, "987");
        assert_eq!(invoice.payment_url, "https://pay.example/c/987");
    }

    #[test]
    fn test_parse_invoice_missing_fields() {
        assert!(parse_invoice(&json!({}), "order-3").is_err());
        assert!(parse_invoice(&json!({ "id": "1" }), "order-3").is_err());
        assert!(parse_invoice(&json!({ "invoice_url": "u" }), "order-3").is_err());
    }

    #[test]
    fn test_parse_invoice_rejects_empty_strings() {
        let response = json!({
            "id": "",
            "invoice_url": "https://pay.example/i/x",
        });
        assert!(parse_invoice(&response, "order-4").is_err());
    }

    #[test]
    fn test_valid_invoice_ids() {
        assert!(valid_invoice_id("12345"));
        assert!(valid_invoice_id("inv_42-A"));
    }

    #[test]
    fn test_invoice_ids_that_would_alter_the_request_target() {
        assert!(!valid_invoice_id(""));
        assert!(!valid_invoice_id("../payment"));
        assert!(!valid_invoice_id(".."));
        assert!(!valid_invoice_id("42?x=1"));
        assert!(!valid_invoice_id("42#frag"));
        assert!(!valid_invoice_id("42/status"));
        assert!(!valid_invoice_id("42%2e%2e"));
    }

    #[tokio::test]
    async fn test_invoice_status_rejects_bad_id_before_any_request() {
        // Unroutable endpoint: the call must fail on validation, not I/O
        let provider =
            PaymentProvider::new(ProviderConfig::new("http://127.0.0.1:0", "key")).unwrap();

        let err = provider.invoice_status("../payment").await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInvoiceId));
    }
}
