//! Seams between the engine and the outside world.
//!
//! The engine core is written against these traits only. Concrete backends (the SQLite store) and
//! integrations (the Mercado Pago client, the QR renderer, the SMTP notifier) implement them, and
//! tests substitute fakes without touching the flows.
mod delivery;
mod payment_provider;
mod ticket_db;

pub use delivery::{Credential, CredentialError, CredentialRenderer, Notifier, NotifyError};
pub use payment_provider::{PaymentProvider, PaymentRecord, PaymentState, ProviderError};
pub use ticket_db::{InsertTicketResult, PaymentEventRecord, TicketDatabase, TicketDbError, UsedUpdate};
