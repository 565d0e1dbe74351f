use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use boletera_engine::{
    deliver,
    events::{EventHandlers, EventHooks, EventProducers},
    FulfillmentApi,
    SqliteDatabase,
    TicketApi,
};
use log::*;
use mp_tools::MercadoPagoApi;

use crate::{
    config::{ServerConfig, ServerOptions},
    credential::QrRenderer,
    errors::ServerError,
    integrations::mercado_pago::{MercadoProvider, VerifierApi},
    notifier::SmtpNotifier,
    routes::{
        create_preference,
        health,
        payment_lookup,
        webhook_ping,
        AdminTicketsRoute,
        IssueTicketRoute,
        LookupTicketRoute,
        PaymentWebhookRoute,
        ResendTicketRoute,
        UseTicketRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let api = MercadoPagoApi::new(config.mercado.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let provider = MercadoProvider::new(api);
    let renderer = QrRenderer::new(config.public_base_url.clone());
    let notifier = SmtpNotifier::new(config.smtp.clone(), config.admin_email.clone());

    // Everything downstream of the ledger write runs on the event queue, so the webhook endpoint
    // never waits on QR rendering or SMTP.
    let mut hooks = EventHooks::default();
    let hook_renderer = renderer.clone();
    let hook_notifier = notifier.clone();
    hooks.on_ticket_issued(move |event| {
        let renderer = hook_renderer.clone();
        let notifier = hook_notifier.clone();
        Box::pin(async move {
            deliver(&event.ticket, &renderer, &notifier).await;
        })
    });
    let handlers = EventHandlers::new(100, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let srv = create_server_instance(config, db, provider, renderer, notifier, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: MercadoProvider,
    renderer: QrRenderer,
    notifier: SmtpNotifier,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    info!("🚀️ Ticket defaults: {:?}", config.defaults);
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let fulfillment_api = FulfillmentApi::new(db.clone(), config.defaults.clone(), producers.clone());
        let ticket_api = TicketApi::new(db.clone());
        let verifier = VerifierApi::new(provider.clone(), config.verify_timeout);
        let options = ServerOptions::from_config(&config);
        let payments_scope = web::scope("/payments")
            .service(webhook_ping)
            .service(PaymentWebhookRoute::<SqliteDatabase, MercadoProvider>::new())
            .service(create_preference)
            .service(payment_lookup);
        let tickets_scope = web::scope("/tickets")
            .service(IssueTicketRoute::<SqliteDatabase>::new())
            .service(UseTicketRoute::<SqliteDatabase>::new())
            .service(ResendTicketRoute::<SqliteDatabase, QrRenderer, SmtpNotifier>::new())
            .service(LookupTicketRoute::<SqliteDatabase>::new());
        let admin_scope = web::scope("/admin").service(AdminTicketsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("blt::access_log"))
            .app_data(web::Data::new(fulfillment_api))
            .app_data(web::Data::new(ticket_api))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(provider.api().clone()))
            .app_data(web::Data::new(renderer.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .app_data(web::Data::new(producers.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(payments_scope)
            .service(tickets_scope)
            .service(admin_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
