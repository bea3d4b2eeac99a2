//! Dropgate Payment Provider Client
//!
//! Thin HTTP client for an external invoice-based payment provider:
//! 1. Create an invoice and hand the buyer its hosted payment page
//! 2. Poll the invoice status until the provider reports it settled
//!
//! The provider's status vocabulary is not under our control, so the set of
//! statuses treated as "paid" is configurable; anything outside the set
//! means "not yet authorized".

pub mod error;
pub mod provider;
pub mod status;

pub use error::{PaymentError, PaymentResult};
pub use provider::{CreateInvoice, Invoice, PaymentProvider, ProviderConfig};
pub use status::AcceptedStatuses;

/// Default request timeout for provider calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
