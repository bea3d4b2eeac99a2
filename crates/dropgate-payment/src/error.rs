//! Payment error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid invoice id")]
    InvalidInvoiceId,
}

pub type PaymentResult<T> = Result<T, PaymentError>;
