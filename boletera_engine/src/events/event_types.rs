use crate::db_types::Ticket;

/// Emitted exactly once per newly created ticket, immediately after the ledger write commits.
/// Duplicate fulfilment attempts (`AlreadyExists`) never emit this event, which is what keeps
/// redeliveries from re-sending buyer emails.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketIssuedEvent {
    pub ticket: Ticket,
}

impl TicketIssuedEvent {
    pub fn new(ticket: Ticket) -> Self {
        Self { ticket }
    }
}
