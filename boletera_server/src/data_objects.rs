use std::fmt::Display;

use boletera_engine::{
    db_types::{Buyer, EventDetails, NewTicket, PaymentRef, Ticket, TicketId},
    TicketDefaults,
};
use blt_common::Pesos;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------   Administrative issuance  ---------------------------------------------------
/// Payload for the manual issuance endpoint. Everything is optional; missing fields fall back to
/// the configured defaults, exactly like a sparse provider record does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueTicketRequest {
    pub id: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_phone: Option<String>,
    pub function_id: Option<String>,
    pub function_label: Option<String>,
    pub event_title: Option<String>,
    /// Price in cents.
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub payment_ref: Option<String>,
}

impl IssueTicketRequest {
    pub fn into_new_ticket(self, defaults: &TicketDefaults) -> NewTicket {
        let non_empty = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let buyer = Buyer {
            name: non_empty(self.buyer_name).unwrap_or_default(),
            email: non_empty(self.buyer_email).unwrap_or_default(),
            phone: non_empty(self.buyer_phone),
        };
        let details = EventDetails {
            event_title: non_empty(self.event_title).unwrap_or_else(|| defaults.event_title.clone()),
            function_id: non_empty(self.function_id).unwrap_or_else(|| defaults.function_id.clone()),
            function_label: non_empty(self.function_label).unwrap_or_else(|| defaults.function_label.clone()),
            price: self.price.map(Pesos::from).unwrap_or(defaults.price),
            currency: non_empty(self.currency).unwrap_or_else(|| defaults.currency.clone()),
        };
        let mut ticket = NewTicket::new(non_empty(self.payment_ref).map(PaymentRef::from), buyer, details);
        ticket.id = non_empty(self.id).map(TicketId::from);
        ticket
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTicketResponse {
    pub ok: bool,
    pub id: TicketId,
    pub reused: bool,
}

//--------------------------------------   Lookup & redemption  -------------------------------------------------------
/// The public face of a ticket: what a buyer or door scanner sees. Contact details beyond the
/// buyer's name stay out of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub event_title: String,
    pub function_label: String,
    pub buyer_name: String,
    pub status: String,
    pub used: bool,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            event_title: ticket.event_title.clone(),
            function_label: ticket.function_label.clone(),
            buyer_name: ticket.buyer_name.clone(),
            status: ticket.status().to_string(),
            used: ticket.used,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    pub ok: bool,
    pub ticket: TicketSummary,
}

impl From<&Ticket> for TicketView {
    fn from(ticket: &Ticket) -> Self {
        Self { ok: true, ticket: TicketSummary::from(ticket) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseTicketResponse {
    pub ok: bool,
    pub id: TicketId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendResponse {
    pub ok: bool,
    pub id: TicketId,
    pub credential_rendered: bool,
    pub notified: bool,
}

//--------------------------------------   Checkout preferences  ------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceRequest {
    pub title: Option<String>,
    pub quantity: Option<u32>,
    /// Unit price in whole currency units, the way the provider's checkout API takes it.
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub pending_url: Option<String>,
    pub metadata: Option<Value>,
}
