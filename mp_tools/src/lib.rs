//! A thin, typed client for the Mercado Pago REST API.
//!
//! Only the two endpoints the ticket server needs are wrapped: authoritative payment lookups
//! (`GET /v1/payments/{id}`) and Checkout Pro preference creation (`POST /checkout/preferences`).
//! The client is explicitly constructed from a [`MercadoConfig`] and passed around by the caller;
//! there is no global instance.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::MercadoPagoApi;
pub use config::MercadoConfig;
pub use data_objects::{
    AdditionalInfo,
    BackUrls,
    CheckoutPreference,
    MercadoPayment,
    NewPreference,
    Payer,
    PaymentItem,
    PaymentStatus,
    PreferenceItem,
};
pub use error::MercadoApiError;

pub mod helpers;
