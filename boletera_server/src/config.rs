use std::{env, time::Duration};

use blt_common::{Pesos, Secret, DEFAULT_CURRENCY_CODE};
use boletera_engine::TicketDefaults;
use log::*;
use mp_tools::MercadoConfig;

const DEFAULT_BLT_HOST: &str = "127.0.0.1";
const DEFAULT_BLT_PORT: u16 = 8360;
const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Public base URL of this server. Ticket credentials encode `{public_base_url}/tickets/{id}`,
    /// so this must be the address buyers and door staff can actually reach.
    pub public_base_url: String,
    /// Webhook URL handed to the provider when a checkout preference is created.
    pub notification_url: Option<String>,
    /// Shared secret for the administrative endpoints. When unset, those endpoints are open;
    /// never run a production instance that way.
    pub admin_api_key: Secret<String>,
    /// Optional operator address that receives a copy of every ticket email.
    pub admin_email: Option<String>,
    /// Bound on how long a provider lookup may block the webhook handler.
    pub verify_timeout: Duration,
    /// Fallbacks for payments that arrive without checkout metadata.
    pub defaults: TicketDefaults,
    pub mercado: MercadoConfig,
    pub smtp: SmtpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BLT_HOST.to_string(),
            port: DEFAULT_BLT_PORT,
            database_url: String::default(),
            public_base_url: format!("http://{DEFAULT_BLT_HOST}:{DEFAULT_BLT_PORT}"),
            notification_url: None,
            admin_api_key: Secret::default(),
            admin_email: None,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            defaults: default_ticket_defaults(),
            mercado: MercadoConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

fn default_ticket_defaults() -> TicketDefaults {
    TicketDefaults {
        event_title: "Evento".to_string(),
        function_id: "funcion-1".to_string(),
        function_label: "Función".to_string(),
        price: Pesos::default(),
        currency: DEFAULT_CURRENCY_CODE.to_string(),
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BLT_HOST").ok().unwrap_or_else(|| DEFAULT_BLT_HOST.into());
        let port = env::var("BLT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BLT_PORT. {e} Using the default, {DEFAULT_BLT_PORT}, instead."
                    );
                    DEFAULT_BLT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BLT_PORT);
        let database_url = env::var("BLT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BLT_DATABASE_URL is not set. Please set it to the URL for the ticket database.");
            String::default()
        });
        let public_base_url = env::var("BLT_PUBLIC_BASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BLT_PUBLIC_BASE_URL is not set. QR credentials will point at the bind address.");
            format!("http://{host}:{port}")
        });
        let notification_url = env::var("BLT_NOTIFICATION_URL").ok();
        let admin_api_key = Secret::new(env::var("BLT_ADMIN_API_KEY").ok().unwrap_or_else(|| {
            warn!("🚨️ BLT_ADMIN_API_KEY is not set. The administrative endpoints are unprotected.");
            String::default()
        }));
        let admin_email = env::var("BLT_ADMIN_EMAIL").ok().filter(|s| !s.is_empty());
        let verify_timeout = env::var("BLT_VERIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for BLT_VERIFY_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_VERIFY_TIMEOUT);
        let defaults = configure_ticket_defaults();
        let mercado = MercadoConfig::new_from_env_or_default();
        let smtp = SmtpConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            public_base_url,
            notification_url,
            admin_api_key,
            admin_email,
            verify_timeout,
            defaults,
            mercado,
            smtp,
        }
    }
}

fn configure_ticket_defaults() -> TicketDefaults {
    let base = default_ticket_defaults();
    let event_title = env::var("BLT_EVENT_TITLE").ok().filter(|s| !s.is_empty()).unwrap_or(base.event_title);
    let function_id = env::var("BLT_FUNCTION_ID").ok().filter(|s| !s.is_empty()).unwrap_or(base.function_id);
    let function_label =
        env::var("BLT_FUNCTION_LABEL").ok().filter(|s| !s.is_empty()).unwrap_or(base.function_label);
    let price = env::var("BLT_PRICE_GENERAL")
        .ok()
        .and_then(|s| {
            s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid configuration value for BLT_PRICE_GENERAL. {e}")).ok()
        })
        .map(Pesos::from)
        .unwrap_or(base.price);
    let currency = env::var("BLT_CURRENCY").ok().filter(|s| !s.is_empty()).unwrap_or(base.currency);
    TicketDefaults { event_title, function_id, function_label, price, currency }
}

//-------------------------------------------------  SmtpConfig  ------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub sender_email: String,
    pub sender_name: String,
    pub reply_to: Option<String>,
}

impl SmtpConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("BLT_SMTP_HOST").ok().unwrap_or_else(|| {
            warn!("🪛️ BLT_SMTP_HOST is not set. Ticket emails will fail until it is configured.");
            "smtp.gmail.com".to_string()
        });
        let port = env::var("BLT_SMTP_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().map_err(|e| warn!("🪛️ Invalid BLT_SMTP_PORT. {e}")).ok())
            .unwrap_or(465);
        let user = env::var("BLT_SMTP_USER").ok().unwrap_or_default();
        let password = Secret::new(env::var("BLT_SMTP_PASS").ok().unwrap_or_default());
        let sender_email = env::var("BLT_SENDER_EMAIL").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| user.clone());
        let sender_name = env::var("BLT_SENDER_NAME").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            "Boletera".to_string()
        });
        let reply_to = env::var("BLT_REPLY_TO").ok().filter(|s| !s.is_empty());
        Self { host, port, user, password, sender_email, sender_name, reply_to }
    }
}

//-------------------------------------------------  ServerOptions  ---------------------------------------------------
/// A subset of the server configuration that request handlers need. Generally we try to keep this
/// as small as possible and exclude everything handlers have no business seeing.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub admin_api_key: Secret<String>,
    pub public_base_url: String,
    pub notification_url: Option<String>,
    pub defaults: TicketDefaults,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            admin_api_key: config.admin_api_key.clone(),
            public_base_url: config.public_base_url.clone(),
            notification_url: config.notification_url.clone(),
            defaults: config.defaults.clone(),
        }
    }
}
