use thiserror::Error;

use crate::traits::TicketDbError;

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("Ticket storage error. {0}")]
    DatabaseError(#[from] TicketDbError),
}

#[derive(Debug, Clone, Error)]
pub enum TicketApiError {
    #[error("Ticket storage error. {0}")]
    DatabaseError(#[from] TicketDbError),
}
