use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use blt_common::Pesos;

//--------------------------------------       TicketId        -------------------------------------------------------
/// Opaque ticket identifier. Generated at issuance and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    /// Generate a fresh identifier. The `t-` prefix keeps ticket ids visually distinct from
    /// payment references when both appear in the same log line.
    pub fn random() -> Self {
        let suffix: String = thread_rng().sample_iter(&Alphanumeric).take(12).map(char::from).collect();
        Self(format!("t-{}", suffix.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TicketId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TicketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------      PaymentRef       -------------------------------------------------------
/// Opaque reference correlating a ticket to the provider payment that funded it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PaymentRef(pub String);

impl PaymentRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference looks like a provider payment id (a long digit string). References
    /// that fail this check are not worth a provider lookup.
    pub fn is_well_formed(&self) -> bool {
        let re = Regex::new(r"^\d{8,20}$").unwrap();
        re.is_match(&self.0)
    }
}

impl From<String> for PaymentRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PaymentRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for PaymentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------        Buyer          -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Buyer {
    pub name: String,
    /// Required for notification. An empty string means the notifier falls back to the configured
    /// sender address.
    pub email: String,
    pub phone: Option<String>,
}

//--------------------------------------     EventDetails      -------------------------------------------------------
/// Denormalized event descriptor, captured at issuance time. Catalog changes after the sale must
/// not alter tickets that have already been issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetails {
    pub event_title: String,
    pub function_id: String,
    pub function_label: String,
    pub price: Pesos,
    pub currency: String,
}

//--------------------------------------      NewTicket        -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    /// Explicit id for administrative re-issuance; generated when absent.
    pub id: Option<TicketId>,
    pub payment_ref: Option<PaymentRef>,
    pub buyer: Buyer,
    pub details: EventDetails,
}

impl NewTicket {
    pub fn new(payment_ref: Option<PaymentRef>, buyer: Buyer, details: EventDetails) -> Self {
        Self { id: None, payment_ref, buyer, details }
    }
}

//--------------------------------------       Ticket          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub payment_ref: Option<PaymentRef>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub event_title: String,
    pub function_id: String,
    pub function_label: String,
    pub price: Pesos,
    pub currency: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn status(&self) -> TicketStatus {
        if self.used {
            TicketStatus::Redeemed
        } else {
            TicketStatus::Issued
        }
    }
}

//--------------------------------------     TicketStatus      -------------------------------------------------------
/// A ticket is `Issued` until the door scan marks it `Redeemed`. `Redeemed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Issued,
    Redeemed,
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Issued => write!(f, "Issued"),
            TicketStatus::Redeemed => write!(f, "Redeemed"),
        }
    }
}
