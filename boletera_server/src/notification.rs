//! Normalization of inbound provider notifications.
//!
//! Mercado Pago delivers the payment reference in several shapes, depending on the notification
//! generation: as a `data.id` query parameter, nested in the JSON body, as a bare `id`, or
//! embedded in a `resource` URL. Each recognized shape has its own extractor; they are tried in
//! order and the first match wins. The whole stage is a pure function of the request: no lookups,
//! no side effects beyond logging, and every input maps to exactly one tagged outcome.
use std::{collections::HashMap, fmt::Display};

use boletera_engine::db_types::PaymentRef;
use log::debug;
use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    /// A payment notification carrying a plausibly-shaped reference. The reference is still only
    /// a hint; the verifier decides what is actually true.
    Payment { payment_ref: PaymentRef },
    /// Not worth a provider lookup. Discards are acknowledged with a success response so the
    /// provider does not keep retrying them.
    Discard { reason: DiscardReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// The declared topic is something other than a payment (e.g. `merchant_order`).
    NotAPayment(String),
    /// No recognized shape produced a reference.
    MissingReference,
    /// A reference was found but does not look like a provider payment id.
    MalformedReference(String),
}

impl Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscardReason::NotAPayment(topic) => write!(f, "event topic '{topic}' is not a payment"),
            DiscardReason::MissingReference => write!(f, "no payment reference in any recognized shape"),
            DiscardReason::MalformedReference(raw) => write!(f, "reference '{raw}' is not a payment id"),
        }
    }
}

type Extractor = fn(&HashMap<String, String>, &Value) -> Option<String>;

const EXTRACTORS: [(&str, Extractor); 5] = [
    ("query data.id", extract_query_data_id),
    ("body data.id", extract_body_data_id),
    ("query id", extract_query_id),
    ("body id", extract_body_id),
    ("resource url", extract_resource_url),
];

pub fn normalize(query: &HashMap<String, String>, body: &Value) -> NormalizedEvent {
    if let Some(topic) = declared_topic(query, body) {
        if !topic.to_lowercase().contains("payment") {
            return NormalizedEvent::Discard { reason: DiscardReason::NotAPayment(topic) };
        }
    }
    for (shape, extract) in EXTRACTORS {
        if let Some(raw) = extract(query, body) {
            debug!("🛰️ Payment reference extracted from {shape}");
            let payment_ref = PaymentRef::from(raw);
            return if payment_ref.is_well_formed() {
                NormalizedEvent::Payment { payment_ref }
            } else {
                NormalizedEvent::Discard { reason: DiscardReason::MalformedReference(payment_ref.0) }
            };
        }
    }
    NormalizedEvent::Discard { reason: DiscardReason::MissingReference }
}

/// The event kind the provider claims to be delivering. `type` and `topic` are both in use,
/// depending on the notification generation.
fn declared_topic(query: &HashMap<String, String>, body: &Value) -> Option<String> {
    query
        .get("type")
        .or_else(|| query.get("topic"))
        .cloned()
        .or_else(|| body.get("type").and_then(value_to_string))
        .or_else(|| body.get("topic").and_then(value_to_string))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_query_data_id(query: &HashMap<String, String>, _body: &Value) -> Option<String> {
    query.get("data.id").filter(|s| !s.is_empty()).cloned()
}

fn extract_body_data_id(_query: &HashMap<String, String>, body: &Value) -> Option<String> {
    body.get("data").and_then(|d| d.get("id")).and_then(value_to_string)
}

fn extract_query_id(query: &HashMap<String, String>, _body: &Value) -> Option<String> {
    query.get("id").filter(|s| !s.is_empty()).cloned()
}

fn extract_body_id(_query: &HashMap<String, String>, body: &Value) -> Option<String> {
    body.get("id").and_then(value_to_string)
}

fn extract_resource_url(query: &HashMap<String, String>, body: &Value) -> Option<String> {
    let resource = query.get("resource").cloned().or_else(|| body.get("resource").and_then(value_to_string))?;
    let re = Regex::new(r"(?i)/payments/(\d+)").unwrap();
    re.captures(&resource).map(|caps| caps[1].to_string())
}
