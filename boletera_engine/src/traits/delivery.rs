use thiserror::Error;

use crate::db_types::Ticket;

/// A scannable artifact for a ticket. Encodes a URL that resolves to the ticket's public lookup
/// endpoint, so scanning the artifact and showing the ticket are the same action.
#[derive(Debug, Clone)]
pub struct Credential {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    pub verify_url: String,
}

#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("Could not render credential: {0}")]
    RenderError(String),
}

/// Produces the scannable credential for a ticket. Rendering is cheap to redo, so failures here
/// never roll a ticket back; the artifact is re-rendered on resend.
pub trait CredentialRenderer: Send + Sync {
    fn render(&self, ticket: &Ticket) -> Result<Credential, CredentialError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("There is no deliverable recipient address")]
    NoRecipient,
    #[error("Could not build message: {0}")]
    InvalidMessage(String),
    #[error("Could not deliver message: {0}")]
    SendError(String),
}

/// Delivers a ticket confirmation to the buyer (and, if configured, a copy to the operator).
/// Best-effort: a ticket is redeemable at the door whether or not the message ever arrives.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send_ticket(&self, ticket: &Ticket, credential: Option<&Credential>) -> Result<(), NotifyError>;
}
