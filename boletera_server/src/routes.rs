//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler is async: the webhook handler in particular talks to the payment provider and
//! the database, and blocking a worker thread on either would stall unrelated requests.
use std::collections::HashMap;

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use boletera_engine::{
    db_types::TicketId,
    deliver,
    events::{EventProducers, TicketIssuedEvent},
    traits::{CredentialRenderer, Notifier, PaymentProvider, ProviderError, TicketDatabase},
    FulfillmentApi,
    FulfillmentResult,
    RedeemOutcome,
    TicketApi,
};
use log::*;
use mp_tools::{BackUrls, MercadoPagoApi, NewPreference, PreferenceItem};
use serde_json::{json, Value};

use crate::{
    config::ServerOptions,
    data_objects::{
        IssueTicketRequest,
        IssueTicketResponse,
        JsonResponse,
        PreferenceRequest,
        ResendResponse,
        TicketView,
        UseTicketResponse,
    },
    errors::ServerError,
    integrations::mercado_pago::VerifierApi,
    notification::{normalize, NormalizedEvent},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Shared-secret guard for the administrative endpoints. When no key is configured the check is a
/// no-op; the config loader already shouted about that at startup.
fn check_admin_key(req: &HttpRequest, options: &ServerOptions) -> Result<(), ServerError> {
    let required = options.admin_api_key.reveal().trim();
    if required.is_empty() {
        return Ok(());
    }
    let given = req.headers().get("x-api-key").and_then(|v| v.to_str().ok()).unwrap_or("").trim();
    if given == required {
        Ok(())
    } else {
        debug!("💻️ Rejected request with missing or wrong x-api-key");
        Err(ServerError::Unauthorized)
    }
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//------------------------------------------   Payment webhook  ------------------------------------------------
route!(payment_webhook => Post "/webhook" impl TicketDatabase, PaymentProvider);
/// The inbound notification endpoint.
///
/// The provider treats anything other than a prompt 2xx as a delivery failure and retries, so
/// every processed outcome (irrelevant topic, payment not visible yet, lookup failure, duplicate
/// delivery) acknowledges with a 200. Only an unparseable body is rejected.
///
/// Nothing in the payload is trusted: the normalizer extracts a candidate payment reference and
/// the verifier re-fetches the authoritative record before fulfilment runs.
pub async fn payment_webhook<BDb, PProv>(
    query: web::Query<HashMap<String, String>>,
    body: web::Bytes,
    verifier: web::Data<VerifierApi<PProv>>,
    fulfillment: web::Data<FulfillmentApi<BDb>>,
) -> Result<HttpResponse, ServerError>
where
    BDb: TicketDatabase,
    PProv: PaymentProvider,
{
    trace!("💻️ Received payment notification");
    let body_value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&body).map_err(|e| {
            warn!("💻️ Unparseable notification body. {e}");
            ServerError::InvalidRequestBody(e.to_string())
        })?
    };
    let result = match normalize(&query, &body_value) {
        NormalizedEvent::Discard { reason } => {
            info!("💻️ Discarding notification: {reason}");
            JsonResponse::success(format!("ignored: {reason}"))
        },
        NormalizedEvent::Payment { payment_ref } => {
            info!("💻️ Notification hints at payment [{payment_ref}]. Verifying with the provider.");
            match verifier.verify(&payment_ref).await {
                Err(ProviderError::NotFound) => {
                    info!("💻️ Payment [{payment_ref}] is not visible at the provider yet. Expecting redelivery.");
                    JsonResponse::success("payment not visible yet")
                },
                Err(ProviderError::Transient(e)) => {
                    warn!("💻️ Provider lookup for [{payment_ref}] failed. Logged for follow-up. {e}");
                    JsonResponse::failure(format!("provider lookup failed: {e}"))
                },
                Ok(record) => match fulfillment.fulfill(record).await {
                    Ok(FulfillmentResult::Issued(ticket)) => {
                        info!("💻️ Payment [{payment_ref}] fulfilled with ticket {}", ticket.id);
                        JsonResponse::success(format!("ticket {} issued", ticket.id))
                    },
                    Ok(FulfillmentResult::AlreadyIssued(ticket)) => {
                        info!("💻️ Payment [{payment_ref}] was already fulfilled with ticket {}", ticket.id);
                        JsonResponse::success(format!("ticket {} already issued", ticket.id))
                    },
                    Ok(FulfillmentResult::Ignored { state, .. }) => {
                        JsonResponse::success(format!("payment is {state}; no ticket issued"))
                    },
                    Err(e) => {
                        warn!("💻️ Could not fulfil payment [{payment_ref}]. {e}");
                        JsonResponse::failure("could not process payment")
                    },
                },
            }
        },
    };
    Ok(HttpResponse::Ok().json(result))
}

/// Courtesy GET on the webhook path: the provider pings it when the URL is registered.
#[get("/webhook")]
pub async fn webhook_ping() -> impl Responder {
    trace!("💻️ Webhook URL ping");
    HttpResponse::Ok().finish()
}

//------------------------------------------   Checkout preference  --------------------------------------------
#[post("/preference")]
/// Create a Checkout Pro preference for the storefront. The function details are attached as
/// preference metadata so the verifier gets them back when the payment is looked up.
pub async fn create_preference(
    body: web::Json<PreferenceRequest>,
    api: web::Data<MercadoPagoApi>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let defaults = &options.defaults;
    debug!("💻️ POST create preference for {:?}", request.title);

    let is_https = |u: &Option<String>| u.as_deref().map(|u| u.to_lowercase().starts_with("https://")).unwrap_or(false);
    // The provider insists on https back URLs; anything else gets the harmless placeholder.
    let success = if is_https(&request.success_url) {
        request.success_url.clone().unwrap_or_default()
    } else {
        "https://example.org/ok".to_string()
    };
    let failure = if is_https(&request.failure_url) { request.failure_url.clone().unwrap_or_default() } else { success.clone() };
    let pending = if is_https(&request.pending_url) { request.pending_url.clone().unwrap_or_default() } else { success.clone() };

    let mut metadata = request.metadata.unwrap_or_else(|| json!({}));
    if let Some(map) = metadata.as_object_mut() {
        map.entry("function_id").or_insert_with(|| json!(defaults.function_id));
        map.entry("function_label").or_insert_with(|| json!(defaults.function_label));
    }
    let preference = NewPreference {
        items: vec![PreferenceItem {
            title: request.title.unwrap_or_else(|| defaults.event_title.clone()),
            quantity: request.quantity.unwrap_or(1).max(1),
            unit_price: request.price.unwrap_or(defaults.price.value() as f64 / 100.0),
            currency_id: request.currency.unwrap_or_else(|| defaults.currency.clone()),
        }],
        back_urls: BackUrls { success, failure, pending },
        auto_return: "approved".to_string(),
        notification_url: options.notification_url.clone(),
        metadata,
    };
    let created = api.create_preference(preference).await.map_err(|e| {
        warn!("💻️ Could not create checkout preference. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "preference": created })))
}

#[get("/payment/{id}")]
/// Operator passthrough to the provider's payment record, for debugging stuck fulfilments.
pub async fn payment_lookup(
    req: HttpRequest,
    path: web::Path<String>,
    api: web::Data<MercadoPagoApi>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    check_admin_key(&req, &options)?;
    let id = path.into_inner();
    debug!("💻️ GET payment {id}");
    let payment = api.get_payment(&id).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "payment": payment })))
}

//----------------------------------------------   Tickets  ----------------------------------------------------
route!(issue_ticket => Post "/issue" impl TicketDatabase);
/// Manual/offline issuance, bypassing the payment pipeline. Protected by the shared API key.
///
/// If the payload carries a `payment_ref` that already has a ticket, the existing ticket id comes
/// back with `reused: true`. Manual references obey the same uniqueness rule as paid ones, so
/// re-posting the same request is harmless.
pub async fn issue_ticket<B: TicketDatabase>(
    req: HttpRequest,
    body: web::Json<IssueTicketRequest>,
    api: web::Data<TicketApi<B>>,
    producers: web::Data<EventProducers>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    check_admin_key(&req, &options)?;
    let new_ticket = body.into_inner().into_new_ticket(&options.defaults);
    debug!("💻️ POST issue ticket for function {}", new_ticket.details.function_id);
    let result = api.issue_ticket(new_ticket).await?;
    let reused = !result.was_inserted();
    if result.was_inserted() {
        for emitter in &producers.ticket_issued_producer {
            emitter.publish_event(TicketIssuedEvent::new(result.ticket().clone())).await;
        }
    }
    Ok(HttpResponse::Ok().json(IssueTicketResponse { ok: true, id: result.ticket().id.clone(), reused }))
}

route!(lookup_ticket => Get "/{id}" impl TicketDatabase);
/// Public ticket lookup: the page a scanned QR resolves to, and the buyer-facing "show your
/// ticket" view. An unknown id is a 404 with a JSON body, which door staff surface as "invalid
/// ticket".
pub async fn lookup_ticket<B: TicketDatabase>(
    path: web::Path<TicketId>,
    api: web::Data<TicketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET ticket {id}");
    match api.lookup(&id).await? {
        Some(ticket) => Ok(HttpResponse::Ok().json(TicketView::from(&ticket))),
        None => Err(ServerError::NotFound),
    }
}

route!(use_ticket => Post "/{id}/use" impl TicketDatabase);
/// Door-side redemption. Scanner UIs double-submit freely; marking an already-used ticket is a
/// normal outcome (`already: true`), never an error.
pub async fn use_ticket<B: TicketDatabase>(
    path: web::Path<TicketId>,
    api: web::Data<TicketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST use ticket {id}");
    let response = match api.redeem(&id).await? {
        RedeemOutcome::NotFound => return Err(ServerError::NotFound),
        RedeemOutcome::Redeemed(ticket) => {
            UseTicketResponse { ok: true, id: ticket.id, used: Some(true), already: None }
        },
        RedeemOutcome::AlreadyRedeemed(ticket) => {
            UseTicketResponse { ok: true, id: ticket.id, used: None, already: Some(true) }
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(resend_ticket => Post "/{id}/resend" impl TicketDatabase, CredentialRenderer, Notifier);
/// Re-run the delivery pipeline for an existing ticket: fresh credential, fresh email. This is
/// the operator's recovery path for failed renders and lost emails.
pub async fn resend_ticket<B, R, N>(
    req: HttpRequest,
    path: web::Path<TicketId>,
    api: web::Data<TicketApi<B>>,
    renderer: web::Data<R>,
    notifier: web::Data<N>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketDatabase,
    R: CredentialRenderer + 'static,
    N: Notifier + 'static,
{
    check_admin_key(&req, &options)?;
    let id = path.into_inner();
    info!("💻️ POST resend ticket {id}");
    let ticket = api.lookup(&id).await?.ok_or(ServerError::NotFound)?;
    let report = deliver(&ticket, renderer.get_ref(), notifier.get_ref()).await;
    Ok(HttpResponse::Ok().json(ResendResponse {
        ok: report.notified,
        id: ticket.id,
        credential_rendered: report.credential.is_some(),
        notified: report.notified,
    }))
}

//----------------------------------------------   Admin  ------------------------------------------------------
route!(admin_tickets => Get "/tickets" impl TicketDatabase);
/// Full ledger dump, newest first. Admin-only; this is the one place buyer contact details leave
/// the system.
pub async fn admin_tickets<B: TicketDatabase>(
    req: HttpRequest,
    api: web::Data<TicketApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    check_admin_key(&req, &options)?;
    debug!("💻️ GET admin tickets");
    let tickets = api.list_tickets().await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "tickets": tickets })))
}
