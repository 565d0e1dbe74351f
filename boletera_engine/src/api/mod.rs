mod errors;
mod fulfillment_api;
mod ticket_api;

pub use errors::{FulfillmentError, TicketApiError};
pub use fulfillment_api::{deliver, DeliveryReport, FulfillmentApi, FulfillmentResult, TicketDefaults};
pub use ticket_api::{RedeemOutcome, TicketApi};
