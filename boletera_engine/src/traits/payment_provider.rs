use std::fmt::Display;

use serde_json::Value;
use thiserror::Error;

use blt_common::Pesos;

use crate::db_types::PaymentRef;

/// Authoritative payment lookups.
///
/// The inbound webhook payload is only ever treated as a hint to re-check; the record returned
/// here is the sole source of truth for the payment's state. Implementations are expected to put
/// a bound on how long a lookup may block; a timeout surfaces as [`ProviderError::Transient`].
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn fetch_payment(&self, payment_ref: &PaymentRef) -> Result<PaymentRecord, ProviderError>;
}

/// The verified state of a payment, reduced to what fulfilment needs. Buyer and function details
/// travel in the record because they were attached to the checkout session as metadata and come
/// back on the lookup.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub payment_ref: PaymentRef,
    pub state: PaymentState,
    pub amount: Option<Pesos>,
    pub currency: Option<String>,
    pub payer_name: Option<String>,
    pub payer_email: Option<String>,
    pub item_title: Option<String>,
    pub function_id: Option<String>,
    pub function_label: Option<String>,
    /// The raw provider response, kept for the audit trail.
    pub raw: Value,
}

/// Provider payment states that matter to fulfilment. Anything that is not an explicit approval
/// is a non-approval; there is no "probably fine" state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentState {
    Approved,
    Pending,
    Declined,
    Refunded,
    Other(String),
}

impl PaymentState {
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentState::Approved)
    }
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Approved => write!(f, "approved"),
            PaymentState::Pending => write!(f, "pending"),
            PaymentState::Declined => write!(f, "declined"),
            PaymentState::Refunded => write!(f, "refunded"),
            PaymentState::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider has no record of the payment yet. Eventual consistency makes this a transient
    /// condition; the provider redelivers once the record exists.
    #[error("The provider has no record of this payment yet")]
    NotFound,
    /// Timeouts, 5xx responses and everything else unexpected. Safe to drop the event because the
    /// provider retries and fulfilment is idempotent.
    #[error("Transient provider failure: {0}")]
    Transient(String),
}
