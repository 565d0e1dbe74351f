//! Queued follow-up steps for fulfilment.
//!
//! The webhook handler must acknowledge quickly and independently of notifier latency, so
//! everything that happens after the ledger write (credential rendering, email) is pushed onto an
//! async channel and handled out of band. The handler functions have no access to engine state;
//! all they receive is the event itself.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::TicketIssuedEvent;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
