//! Boletera Ticket Engine
//!
//! The engine holds everything about selling and redeeming event tickets that has to be correct
//! under retries, duplicate webhook deliveries and partial failures. It is provider-agnostic: the
//! payment provider, the credential renderer and the notifier are injected behind the traits in
//! [`mod@traits`].
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly; use the public APIs instead. The
//!    exception is the data types used in the database, which are defined in [`mod@db_types`] and
//!    are public.
//! 2. The engine public API ([`mod@api`]): fulfilment of verified payments and ticket
//!    lookup/redemption.
//! 3. An event hook system ([`mod@events`]) for the follow-up work that runs after a ticket is
//!    created (credential rendering, buyer notification). Hooks run out of band so the webhook
//!    endpoint can acknowledge without waiting on them.
mod api;

pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use api::{
    deliver,
    DeliveryReport,
    FulfillmentApi,
    FulfillmentError,
    FulfillmentResult,
    RedeemOutcome,
    TicketApi,
    TicketApiError,
    TicketDefaults,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
