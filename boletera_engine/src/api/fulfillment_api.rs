use std::fmt::Debug;

use log::*;

use blt_common::Pesos;

use crate::{
    db_types::{Buyer, EventDetails, NewTicket, PaymentRef, Ticket},
    events::{EventProducers, TicketIssuedEvent},
    traits::{
        Credential,
        CredentialRenderer,
        InsertTicketResult,
        Notifier,
        PaymentEventRecord,
        PaymentRecord,
        PaymentState,
        TicketDatabase,
    },
    FulfillmentError,
};

/// Fallbacks for fields the provider record may not carry. The original checkout attaches the
/// function details as metadata, but a payment can also arrive with that metadata stripped (e.g.
/// a manual charge made from the provider dashboard).
#[derive(Debug, Clone)]
pub struct TicketDefaults {
    pub event_title: String,
    pub function_id: String,
    pub function_label: String,
    pub price: Pesos,
    pub currency: String,
}

/// Outcome of a fulfilment attempt. `AlreadyIssued` is a success: the payment already produced
/// its one ticket on an earlier delivery and nothing further happened, in particular no second
/// buyer email.
#[derive(Debug, Clone)]
pub enum FulfillmentResult {
    Issued(Ticket),
    AlreadyIssued(Ticket),
    Ignored { payment_ref: PaymentRef, state: PaymentState },
}

impl FulfillmentResult {
    pub fn ticket(&self) -> Option<&Ticket> {
        match self {
            FulfillmentResult::Issued(t) | FulfillmentResult::AlreadyIssued(t) => Some(t),
            FulfillmentResult::Ignored { .. } => None,
        }
    }
}

/// `FulfillmentApi` turns a verified payment into at most one ticket.
///
/// The ledger insert is the only serialization point in the pipeline; everything downstream of it
/// (credential rendering, notification) is queued onto the event channel and ordered by
/// decreasing reversibility. A crash after the insert leaves the system in a state where
/// re-invoking [`FulfillmentApi::fulfill`] with the same record is safe: the insert resolves to
/// `AlreadyExists` and no side effects are re-triggered.
pub struct FulfillmentApi<B> {
    db: B,
    defaults: TicketDefaults,
    producers: EventProducers,
}

impl<B> Debug for FulfillmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentApi")
    }
}

impl<B> FulfillmentApi<B> {
    pub fn new(db: B, defaults: TicketDefaults, producers: EventProducers) -> Self {
        Self { db, defaults, producers }
    }
}

impl<B> FulfillmentApi<B>
where B: TicketDatabase
{
    /// Process a verified payment record.
    ///
    /// Every record is appended to the audit trail, whatever its state. A ticket is only created
    /// for approved payments, and only if the payment has not produced one already.
    pub async fn fulfill(&self, record: PaymentRecord) -> Result<FulfillmentResult, FulfillmentError> {
        let audit = PaymentEventRecord {
            payment_ref: record.payment_ref.clone(),
            status: record.state.to_string(),
            payer_email: record.payer_email.clone(),
            raw: record.raw.clone(),
        };
        if let Err(e) = self.db.record_payment_event(audit).await {
            // The audit trail is diagnostics, not ledger state. Fulfilment proceeds.
            warn!("🎫️ Could not record payment event for [{}]. {e}", record.payment_ref);
        }
        if !record.state.is_approved() {
            info!("🎫️ Payment [{}] is {}, not approved. No ticket will be issued.", record.payment_ref, record.state);
            return Ok(FulfillmentResult::Ignored { payment_ref: record.payment_ref, state: record.state });
        }
        let new_ticket = self.ticket_from_record(&record);
        match self.db.insert_ticket(new_ticket).await? {
            InsertTicketResult::Inserted(ticket) => {
                info!("🎫️ Ticket {} issued for payment [{}]", ticket.id, record.payment_ref);
                self.call_ticket_issued_hook(&ticket).await;
                Ok(FulfillmentResult::Issued(ticket))
            },
            InsertTicketResult::AlreadyExists(ticket) => {
                info!("🎫️ Payment [{}] already has ticket {}. Nothing to do.", record.payment_ref, ticket.id);
                Ok(FulfillmentResult::AlreadyIssued(ticket))
            },
        }
    }

    async fn call_ticket_issued_hook(&self, ticket: &Ticket) {
        for emitter in &self.producers.ticket_issued_producer {
            debug!("🎫️ Notifying ticket issued hook subscribers for {}", ticket.id);
            let event = TicketIssuedEvent::new(ticket.clone());
            emitter.publish_event(event).await;
        }
    }

    fn ticket_from_record(&self, record: &PaymentRecord) -> NewTicket {
        let defaults = &self.defaults;
        let buyer = Buyer {
            name: record.payer_name.clone().unwrap_or_default(),
            email: record.payer_email.clone().unwrap_or_default(),
            phone: None,
        };
        let details = EventDetails {
            event_title: record.item_title.clone().unwrap_or_else(|| defaults.event_title.clone()),
            function_id: record.function_id.clone().unwrap_or_else(|| defaults.function_id.clone()),
            function_label: record
                .function_label
                .clone()
                .or_else(|| record.item_title.clone())
                .unwrap_or_else(|| defaults.function_label.clone()),
            price: record.amount.unwrap_or(defaults.price),
            currency: record.currency.clone().unwrap_or_else(|| defaults.currency.clone()),
        };
        NewTicket::new(Some(record.payment_ref.clone()), buyer, details)
    }
}

//--------------------------------------   Delivery pipeline   -------------------------------------------------------

/// What actually happened when a ticket's side effects ran. A missing credential or a failed
/// notification is a degraded success: the ticket stands and both steps can be redone later.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub credential: Option<Credential>,
    pub render_error: Option<String>,
    pub notified: bool,
    pub notify_error: Option<String>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.credential.is_some() && self.notified
    }
}

/// Run the post-issuance steps for a ticket: render the credential, then notify the buyer with
/// the credential attached if rendering succeeded. Each step's failure is captured in the report
/// and never aborts the remaining steps.
pub async fn deliver<R, N>(ticket: &Ticket, renderer: &R, notifier: &N) -> DeliveryReport
where
    R: CredentialRenderer + ?Sized,
    N: Notifier + ?Sized,
{
    let mut report = DeliveryReport::default();
    match renderer.render(ticket) {
        Ok(credential) => {
            debug!("🎫️ Credential rendered for ticket {}", ticket.id);
            report.credential = Some(credential);
        },
        Err(e) => {
            warn!("🎫️ Could not render credential for ticket {}. The ticket stands; re-render later. {e}", ticket.id);
            report.render_error = Some(e.to_string());
        },
    }
    match notifier.send_ticket(ticket, report.credential.as_ref()).await {
        Ok(()) => {
            debug!("🎫️ Buyer notified for ticket {}", ticket.id);
            report.notified = true;
        },
        Err(e) => {
            warn!("🎫️ Could not notify buyer for ticket {}. The ticket stands; resend later. {e}", ticket.id);
            report.notify_error = Some(e.to_string());
        },
    }
    if report.is_complete() {
        info!("🎫️ Delivery for ticket {} complete", ticket.id);
    } else {
        warn!("🎫️ Delivery for ticket {} is incomplete. See earlier log entries for the failing step.", ticket.id);
    }
    report
}
