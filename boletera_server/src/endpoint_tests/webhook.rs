use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use boletera_engine::{
    db_types::PaymentRef,
    deliver,
    events::{EventHandlers, EventHooks},
    traits::{PaymentState, ProviderError, TicketDatabase},
    FulfillmentApi,
    SqliteDatabase,
};

use crate::{
    endpoint_tests::{
        helpers::{approved_record, test_db, ticket_defaults},
        mocks::{CountingNotifier, FakeRenderer, MockProvider},
    },
    integrations::mercado_pago::VerifierApi,
    routes::webhook_ping,
};

struct WebhookHarness {
    db: SqliteDatabase,
    notifier: CountingNotifier,
    fulfillment: web::Data<FulfillmentApi<SqliteDatabase>>,
    verifier: web::Data<VerifierApi<MockProvider>>,
}

async fn webhook_harness(provider: MockProvider) -> WebhookHarness {
    let db = test_db().await;
    let notifier = CountingNotifier::default();
    let mut hooks = EventHooks::default();
    let hook_notifier = notifier.clone();
    hooks.on_ticket_issued(move |event| {
        let renderer = FakeRenderer { fail: false };
        let notifier = hook_notifier.clone();
        Box::pin(async move {
            deliver(&event.ticket, &renderer, &notifier).await;
        })
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let fulfillment = web::Data::new(FulfillmentApi::new(db.clone(), ticket_defaults(), producers));
    let verifier = web::Data::new(VerifierApi::new(provider, Duration::from_secs(5)));
    WebhookHarness { db, notifier, fulfillment, verifier }
}

macro_rules! webhook_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .app_data($harness.fulfillment.clone())
                .app_data($harness.verifier.clone())
                .service(web::scope("/payments").service(webhook_ping).service(
                    crate::routes::PaymentWebhookRoute::<SqliteDatabase, MockProvider>::new(),
                )),
        )
        .await
    };
}

#[actix_web::test]
async fn merchant_order_events_are_discarded_without_a_provider_lookup() {
    let mut provider = MockProvider::new();
    provider.expect_fetch_payment().times(0);
    let harness = webhook_harness(provider).await;
    let app = webhook_app!(harness);

    let req = test::TestRequest::post().uri("/payments/webhook?topic=merchant_order&id=12345678901").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert!(harness.db.fetch_all_tickets().await.unwrap().is_empty());
}

#[actix_web::test]
async fn duplicate_deliveries_produce_one_ticket_and_one_email() {
    let mut provider = MockProvider::new();
    provider
        .expect_fetch_payment()
        .times(2)
        .returning(|payment_ref| Ok(approved_record(payment_ref)));
    let harness = webhook_harness(provider).await;
    let app = webhook_app!(harness);

    let body = serde_json::json!({"type": "payment", "data": {"id": "12345678901"}});
    let req = test::TestRequest::post().uri("/payments/webhook").set_json(&body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    // The provider redelivers the same event shortly afterwards.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let req = test::TestRequest::post().uri("/payments/webhook").set_json(&body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let tickets = harness.db.fetch_all_tickets().await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].payment_ref, Some(PaymentRef::from("12345678901")));

    // Let the delivery queue drain, then confirm only one buyer email went out.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.notifier.count(), 1);
}

#[actix_web::test]
async fn payments_not_yet_visible_are_acknowledged_without_a_ticket() {
    let mut provider = MockProvider::new();
    provider.expect_fetch_payment().times(1).returning(|_| Err(ProviderError::NotFound));
    let harness = webhook_harness(provider).await;
    let app = webhook_app!(harness);

    let req = test::TestRequest::post().uri("/payments/webhook?type=payment&data.id=99999999999").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert!(harness.db.fetch_all_tickets().await.unwrap().is_empty());
}

#[actix_web::test]
async fn provider_failures_are_acknowledged_and_logged_for_follow_up() {
    let mut provider = MockProvider::new();
    provider
        .expect_fetch_payment()
        .times(1)
        .returning(|_| Err(ProviderError::Transient("503 from provider".to_string())));
    let harness = webhook_harness(provider).await;
    let app = webhook_app!(harness);

    let req = test::TestRequest::post().uri("/payments/webhook?type=payment&data.id=12345678901").to_request();
    let res = test::call_service(&app, req).await;
    // Still a 200: the provider must not treat us as down and the redelivered event is safe.
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], false);
    assert!(harness.db.fetch_all_tickets().await.unwrap().is_empty());
}

#[actix_web::test]
async fn non_approved_payments_are_acknowledged_without_a_ticket() {
    let mut provider = MockProvider::new();
    provider.expect_fetch_payment().times(1).returning(|payment_ref| {
        let mut record = approved_record(payment_ref);
        record.state = PaymentState::Declined;
        Ok(record)
    });
    let harness = webhook_harness(provider).await;
    let app = webhook_app!(harness);

    let req = test::TestRequest::post().uri("/payments/webhook?type=payment&data.id=12345678901").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(harness.db.fetch_all_tickets().await.unwrap().is_empty());
}

#[actix_web::test]
async fn unparseable_bodies_are_the_one_rejected_case() {
    let mut provider = MockProvider::new();
    provider.expect_fetch_payment().times(0);
    let harness = webhook_harness(provider).await;
    let app = webhook_app!(harness);

    let req = test::TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_url_pings_get_a_200() {
    let provider = MockProvider::new();
    let harness = webhook_harness(provider).await;
    let app = webhook_app!(harness);

    let req = test::TestRequest::get().uri("/payments/webhook").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}
