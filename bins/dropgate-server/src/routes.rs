//! HTTP routes
//!
//! Three endpoints drive the purchase flow:
//! - `POST /api/create-payment` creates a provider invoice
//! - `GET /api/exchange?invoice_id=` swaps a settled invoice for a token
//! - `GET /api/download?token=` verifies the token and streams the asset
//!
//! Every token rejection maps to the same 403 body; which check failed is
//! logged internally and never echoed to the caller.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use dropgate_payment::{AcceptedStatuses, CreateInvoice, PaymentProvider, ProviderConfig};
use dropgate_token::{TokenIssuer, TokenVerifier};

use crate::asset::AssetStore;
use crate::config::ServerConfig;

/// Shared handler state
pub struct AppState {
    provider: PaymentProvider,
    accepted: AcceptedStatuses,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    asset: AssetStore,
    price_amount: f64,
    price_currency: String,
    success_url: Option<String>,
    ipn_callback_url: Option<String>,
    ttl_seconds: i64,
}

impl AppState {
    /// Build the full handler state from a validated config
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let provider = PaymentProvider::new(ProviderConfig::new(
            &config.payment.api_url,
            &config.payment.api_key,
        ))?;

        let secret = config.token.secret.as_bytes().to_vec();

        Ok(Self {
            provider,
            accepted: AcceptedStatuses::new(&config.payment.accepted_statuses),
            issuer: TokenIssuer::new(secret.clone())?,
            verifier: TokenVerifier::new(secret)?,
            asset: AssetStore::new(&config.asset),
            price_amount: config.payment.price_amount,
            price_currency: config.payment.price_currency.clone(),
            success_url: config.payment.success_url.clone(),
            ipn_callback_url: config.payment.ipn_callback_url.clone(),
            ttl_seconds: config.token.ttl_seconds,
        })
    }
}

/// Build the application router.
///
/// The request span records the path only, never the query string: download
/// URLs carry the capability token as a query parameter, and the default
/// span maker would copy the full URI into every log line of the request.
pub fn router(state: Arc<AppState>) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    Router::new()
        .route("/api/create-payment", post(create_payment))
        .route("/api/exchange", get(exchange))
        .route("/api/download", get(download))
        .layer(trace)
        .with_state(state)
}

async fn create_payment(State(state): State<Arc<AppState>>) -> Response {
    let order_id = format!("dropgate-{}", Utc::now().timestamp_millis());

    let request = CreateInvoice {
        price_amount: state.price_amount,
        price_currency: state.price_currency.clone(),
        order_id: order_id.clone(),
        success_url: state.success_url.clone(),
        ipn_callback_url: state.ipn_callback_url.clone(),
    };

    match state.provider.create_invoice(&request).await {
        Ok(invoice) => {
            info!("Created invoice {} for order {}", invoice.invoice_id, order_id);
            Json(json!({
                "invoice_id": invoice.invoice_id,
                "payment_url": invoice.payment_url,
                "order_id": invoice.order_id,
            }))
            .into_response()
        }
        Err(e) => {
            error!("Invoice creation failed: {}", e);
            provider_error()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeQuery {
    invoice_id: String,
}

async fn exchange(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExchangeQuery>,
) -> Response {
    if query.invoice_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invoice_id required" })),
        )
            .into_response();
    }

    let status = match state.provider.invoice_status(&query.invoice_id).await {
        Ok(status) => status,
        Err(e) => {
            error!("Status lookup failed for invoice {}: {}", query.invoice_id, e);
            return provider_error();
        }
    };

    if !state.accepted.is_authorized(&status) {
        debug!("Invoice {} not settled yet: {}", query.invoice_id, status);
        return Json(json!({ "ok": false, "status": status })).into_response();
    }

    match state.issuer.issue(&query.invoice_id, state.ttl_seconds) {
        Ok(token) => {
            info!("Issued download token for invoice {}", query.invoice_id);
            Json(json!({
                "ok": true,
                "download_url": download_url(&token),
                "expiry_seconds": state.ttl_seconds,
            }))
            .into_response()
        }
        Err(e) => {
            error!("Token issuance failed for invoice {}: {}", query.invoice_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    token: String,
}

async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let payload = match state.verifier.verify_now(&query.token) {
        Ok(payload) => payload,
        Err(kind) => {
            // Log the kind internally; the response stays uniform
            warn!("Rejected token {}…: {}", token_prefix(&query.token), kind);
            return forbidden();
        }
    };

    info!("Token accepted, releasing asset for resource {}", payload.resource_id);

    let (file, len) = match state.asset.open().await {
        Ok(opened) => opened,
        Err(e) => {
            error!("Asset unavailable: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "asset unavailable" })),
            )
                .into_response();
        }
    };

    let headers = [
        (header::CONTENT_TYPE, state.asset.content_type().to_string()),
        (header::CONTENT_LENGTH, len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", state.asset.download_name()),
        ),
    ];

    (StatusCode::OK, headers, Body::from_stream(ReaderStream::new(file))).into_response()
}

/// The uniform response for every token rejection kind
fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" }))).into_response()
}

fn provider_error() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": "payment provider error" })),
    )
        .into_response()
}

/// Relative URL the client follows to start the download.
///
/// Tokens use only the base64url and hex alphabets plus `.`, so no percent
/// encoding is needed.
fn download_url(token: &str) -> String {
    format!("/api/download?token={}", token)
}

/// First few characters of a token, safe to log
fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn test_state() -> Arc<AppState> {
        let mut config = ServerConfig::default();
        config.token.secret = "test-secret".to_string();
        config.payment.api_key = "test-key".to_string();
        Arc::new(AppState::from_config(&config).unwrap())
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET.to_vec()).unwrap()
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn assert_forbidden(token: &str) {
        let (status, body) = get(router(test_state()), &download_url(token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "forbidden" }));
    }

    #[tokio::test]
    async fn test_download_rejects_malformed_token() {
        assert_forbidden("garbage").await;
    }

    #[tokio::test]
    async fn test_download_rejects_tampered_token() {
        let token = issuer().issue("inv-1", 600).unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert_forbidden(&tampered).await;
    }

    #[tokio::test]
    async fn test_download_rejects_wrong_secret_token() {
        let other = TokenIssuer::new(b"other-secret".to_vec()).unwrap();
        let token = other.issue("inv-1", 600).unwrap();

        assert_forbidden(&token).await;
    }

    #[tokio::test]
    async fn test_download_rejects_expired_token() {
        // Expired long ago relative to the system clock
        let token = issuer().issue_at("inv-1", 600, 1000).unwrap();

        assert_forbidden(&token).await;
    }

    #[tokio::test]
    async fn test_missing_asset_is_distinct_from_token_failure() {
        // Valid token, but the default asset path does not exist here
        let token = issuer().issue("inv-1", 600).unwrap();
        let (status, body) = get(router(test_state()), &download_url(&token)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "asset unavailable" }));
    }

    /// Collects formatted log output for inspection
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_logs_never_contain_full_token() {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let token = issuer().issue("inv-1", 600).unwrap();
        let (status, _) = get(router(test_state()), &download_url(&token)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let logs = buffer.contents();
        // The request was traced, but neither token half may appear
        assert!(logs.contains("/api/download"), "expected request logs, got: {}", logs);
        let (encoded, signature) = token.split_once('.').unwrap();
        assert!(!logs.contains(encoded), "encoded payload leaked into logs");
        assert!(!logs.contains(signature), "signature leaked into logs");
    }

    #[tokio::test]
    async fn test_rejection_logs_only_token_prefix() {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let other = TokenIssuer::new(b"other-secret".to_vec()).unwrap();
        let token = other.issue("inv-1", 600).unwrap();
        assert_forbidden(&token).await;

        let logs = buffer.contents();
        let (encoded, signature) = token.split_once('.').unwrap();
        assert!(logs.contains(&token_prefix(&token)), "rejection should be logged");
        assert!(!logs.contains(encoded), "encoded payload leaked into logs");
        assert!(!logs.contains(signature), "signature leaked into logs");
    }

    #[test]
    fn test_download_url_needs_no_percent_encoding() {
        let token = issuer().issue_at("invoice-1", 600, 1000).unwrap();
        let url = download_url(&token);

        assert!(url.starts_with("/api/download?token="));
        assert!(url
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/?=._-~&".contains(c)));
    }

    #[test]
    fn test_token_prefix_truncates() {
        assert_eq!(token_prefix("abcdefghij"), "abcdefgh");
        assert_eq!(token_prefix("abc"), "abc");
        assert_eq!(token_prefix(""), "");
    }

    #[test]
    fn test_forbidden_is_uniform_403() {
        let response = forbidden();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
