//! # Boletera server
//! This module hosts the HTTP surface of the ticket system. It is responsible for:
//! * Listening for asynchronous payment notifications from Mercado Pago, normalizing them and
//!   driving the verify-then-fulfil pipeline.
//! * Creating checkout preferences for the storefront.
//! * Serving ticket lookups and the door-side redemption transition.
//! * The administrative issuance/listing/resend endpoints, protected by a shared API key.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
pub mod cli;
pub mod config;
pub mod credential;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod notification;
pub mod notifier;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
