use blt_common::Secret;
use log::*;

#[derive(Debug, Clone)]
pub struct MercadoConfig {
    /// Base URL for the Mercado Pago API. Overridable so that tests can point the client at a
    /// local stub server.
    pub base_url: String,
    pub access_token: Secret<String>,
}

impl Default for MercadoConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), access_token: Secret::default() }
    }
}

const DEFAULT_BASE_URL: &str = "https://api.mercadopago.com";

impl MercadoConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("BLT_MP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let access_token = Secret::new(std::env::var("BLT_MP_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("BLT_MP_ACCESS_TOKEN not set. Payment lookups against the live API will be rejected.");
            String::default()
        }));
        Self { base_url, access_token }
    }
}
