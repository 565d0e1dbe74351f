use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewTicket, Ticket, TicketId},
    traits::{InsertTicketResult, TicketDatabase},
    TicketApiError,
};

/// Outcome of a redemption attempt. "Already redeemed" is a normal, expected result under
/// door-side double-taps, not an error; an unknown id is a distinguishable outcome rather than a
/// failure, because door staff treat it as "invalid ticket" feedback.
#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    Redeemed(Ticket),
    AlreadyRedeemed(Ticket),
    NotFound,
}

/// `TicketApi` is the public face of the ticket ledger: lookups and the one-way redemption
/// transition for door staff, plus the administrative issuance and listing paths.
pub struct TicketApi<B> {
    db: B,
}

impl<B> Debug for TicketApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketApi")
    }
}

impl<B> TicketApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TicketApi<B>
where B: TicketDatabase
{
    /// Administrative issuance, bypassing the payment pipeline. If the caller supplies a payment
    /// reference that already has a ticket, the existing ticket is returned: the uniqueness
    /// invariant holds for manually set references too.
    pub async fn issue_ticket(&self, ticket: NewTicket) -> Result<InsertTicketResult, TicketApiError> {
        let result = self.db.insert_ticket(ticket).await?;
        match &result {
            InsertTicketResult::Inserted(t) => info!("🎫️ Ticket {} issued manually", t.id),
            InsertTicketResult::AlreadyExists(t) => {
                info!("🎫️ Manual issuance matched an existing ticket {}. Returning it unchanged.", t.id)
            },
        }
        Ok(result)
    }

    pub async fn lookup(&self, id: &TicketId) -> Result<Option<Ticket>, TicketApiError> {
        let ticket = self.db.fetch_ticket(id).await?;
        Ok(ticket)
    }

    /// The guarded Issued → Redeemed transition. Nothing reverts it.
    pub async fn redeem(&self, id: &TicketId) -> Result<RedeemOutcome, TicketApiError> {
        let outcome = match self.db.mark_ticket_used(id).await? {
            None => {
                debug!("🎫️ Redemption attempt for unknown ticket {id}");
                RedeemOutcome::NotFound
            },
            Some(update) if update.changed => {
                info!("🎫️ Ticket {id} redeemed");
                RedeemOutcome::Redeemed(update.ticket)
            },
            Some(update) => {
                info!("🎫️ Ticket {id} was already redeemed");
                RedeemOutcome::AlreadyRedeemed(update.ticket)
            },
        };
        Ok(outcome)
    }

    /// All tickets, newest first.
    pub async fn list_tickets(&self) -> Result<Vec<Ticket>, TicketApiError> {
        let tickets = self.db.fetch_all_tickets().await?;
        Ok(tickets)
    }
}
