use serde_json::Value;
use thiserror::Error;

use crate::db_types::{NewTicket, PaymentRef, Ticket, TicketId};

/// Storage contract for the ticket ledger.
///
/// The single hard requirement on implementations is that [`TicketDatabase::insert_ticket`]
/// enforces at-most-one-ticket-per-payment at the storage layer itself. Two concurrent inserts for
/// the same payment reference must resolve to exactly one `Inserted` and one `AlreadyExists`,
/// without any cooperation from callers.
#[allow(async_fn_in_trait)]
pub trait TicketDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Atomically insert a new ticket. If a ticket already exists for the payment reference, the
    /// existing record is returned instead and nothing is written.
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<InsertTicketResult, TicketDbError>;

    async fn fetch_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, TicketDbError>;

    async fn fetch_ticket_by_payment_ref(&self, payment_ref: &PaymentRef) -> Result<Option<Ticket>, TicketDbError>;

    /// Flip `used` from false to true. The transition is one-way: marking an already-used ticket
    /// reports `changed: false` and leaves the row alone. Returns `None` if the id is unknown.
    async fn mark_ticket_used(&self, id: &TicketId) -> Result<Option<UsedUpdate>, TicketDbError>;

    /// All tickets, newest first.
    async fn fetch_all_tickets(&self) -> Result<Vec<Ticket>, TicketDbError>;

    /// Append a verified provider payment to the audit trail.
    async fn record_payment_event(&self, event: PaymentEventRecord) -> Result<(), TicketDbError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), TicketDbError> {
        Ok(())
    }
}

/// Outcome of an insert attempt. `AlreadyExists` is a success from the pipeline's point of view:
/// the payment already produced its one ticket.
#[derive(Debug, Clone)]
pub enum InsertTicketResult {
    Inserted(Ticket),
    AlreadyExists(Ticket),
}

impl InsertTicketResult {
    pub fn ticket(&self) -> &Ticket {
        match self {
            InsertTicketResult::Inserted(t) | InsertTicketResult::AlreadyExists(t) => t,
        }
    }

    pub fn into_ticket(self) -> Ticket {
        match self {
            InsertTicketResult::Inserted(t) | InsertTicketResult::AlreadyExists(t) => t,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, InsertTicketResult::Inserted(_))
    }
}

#[derive(Debug, Clone)]
pub struct UsedUpdate {
    pub ticket: Ticket,
    pub changed: bool,
}

/// One row of the payment audit trail.
#[derive(Debug, Clone)]
pub struct PaymentEventRecord {
    pub payment_ref: PaymentRef,
    pub status: String,
    pub payer_email: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, Error)]
pub enum TicketDbError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested ticket {0} does not exist")]
    TicketNotFound(TicketId),
}

impl From<sqlx::Error> for TicketDbError {
    fn from(e: sqlx::Error) -> Self {
        TicketDbError::DatabaseError(e.to_string())
    }
}
