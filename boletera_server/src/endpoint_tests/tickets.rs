use actix_web::{http::StatusCode, test, web, App};
use boletera_engine::{events::EventProducers, SqliteDatabase, TicketApi};
use serde_json::json;

use crate::{
    endpoint_tests::{
        helpers::{server_options, test_db, TEST_ADMIN_KEY},
        mocks::{CountingNotifier, FakeRenderer},
    },
    routes::{AdminTicketsRoute, IssueTicketRoute, LookupTicketRoute, ResendTicketRoute, UseTicketRoute},
};

macro_rules! tickets_app {
    ($db:expr, $renderer:expr, $notifier:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(TicketApi::new($db.clone())))
                .app_data(web::Data::new(EventProducers::default()))
                .app_data(web::Data::new(server_options()))
                .app_data(web::Data::new($renderer))
                .app_data(web::Data::new($notifier))
                .service(
                    web::scope("/tickets")
                        .service(IssueTicketRoute::<SqliteDatabase>::new())
                        .service(UseTicketRoute::<SqliteDatabase>::new())
                        .service(ResendTicketRoute::<SqliteDatabase, FakeRenderer, CountingNotifier>::new())
                        .service(LookupTicketRoute::<SqliteDatabase>::new()),
                )
                .service(web::scope("/admin").service(AdminTicketsRoute::<SqliteDatabase>::new())),
        )
        .await
    };
}

fn issue_body() -> serde_json::Value {
    json!({
        "buyer_name": "Ana",
        "buyer_email": "ana@example.com",
        "function_id": "funcion-1",
        "function_label": "Sáb 6 Dic 18:00",
        "event_title": "Los Miserables",
        "price": 25000,
        "currency": "MXN"
    })
}

#[actix_web::test]
async fn issuance_requires_the_shared_api_key() {
    let db = test_db().await;
    let app = tickets_app!(db, FakeRenderer { fail: false }, CountingNotifier::default());

    let req = test::TestRequest::post().uri("/tickets/issue").set_json(issue_body()).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/tickets/issue")
        .insert_header(("x-api-key", "wrong-key"))
        .set_json(issue_body())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/tickets/issue")
        .insert_header(("x-api-key", TEST_ADMIN_KEY))
        .set_json(issue_body())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["reused"], false);
}

#[actix_web::test]
async fn manual_issuance_with_a_known_payment_ref_reuses_the_ticket() {
    let db = test_db().await;
    let app = tickets_app!(db, FakeRenderer { fail: false }, CountingNotifier::default());

    let mut payload = issue_body();
    payload["payment_ref"] = json!("12345678901");
    let req = test::TestRequest::post()
        .uri("/tickets/issue")
        .insert_header(("x-api-key", TEST_ADMIN_KEY))
        .set_json(&payload)
        .to_request();
    let first: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(first["reused"], false);

    let req = test::TestRequest::post()
        .uri("/tickets/issue")
        .insert_header(("x-api-key", TEST_ADMIN_KEY))
        .set_json(&payload)
        .to_request();
    let second: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(second["reused"], true);
    assert_eq!(second["id"], first["id"]);
}

#[actix_web::test]
async fn lookup_of_unknown_ids_is_a_clean_not_found() {
    let db = test_db().await;
    let app = tickets_app!(db, FakeRenderer { fail: false }, CountingNotifier::default());

    let req = test::TestRequest::get().uri("/tickets/t-doesnotexist").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_web::test]
async fn double_redemption_reports_changed_then_already() {
    let db = test_db().await;
    let app = tickets_app!(db, FakeRenderer { fail: false }, CountingNotifier::default());

    let req = test::TestRequest::post()
        .uri("/tickets/issue")
        .insert_header(("x-api-key", TEST_ADMIN_KEY))
        .set_json(issue_body())
        .to_request();
    let issued: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = issued["id"].as_str().expect("issue response has no id").to_string();

    let req = test::TestRequest::post().uri(&format!("/tickets/{id}/use")).to_request();
    let first: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(first["ok"], true);
    assert_eq!(first["used"], true);
    assert!(first.get("already").is_none());

    let req = test::TestRequest::post().uri(&format!("/tickets/{id}/use")).to_request();
    let second: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(second["ok"], true);
    assert_eq!(second["already"], true);

    // The lookup view reflects the terminal state.
    let req = test::TestRequest::get().uri(&format!("/tickets/{id}")).to_request();
    let view: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(view["ticket"]["status"], "Redeemed");
    assert_eq!(view["ticket"]["used"], true);
}

#[actix_web::test]
async fn resend_with_a_broken_renderer_still_notifies_and_keeps_the_ticket() {
    let db = test_db().await;
    let notifier = CountingNotifier::default();
    let app = tickets_app!(db, FakeRenderer { fail: true }, notifier.clone());

    let req = test::TestRequest::post()
        .uri("/tickets/issue")
        .insert_header(("x-api-key", TEST_ADMIN_KEY))
        .set_json(issue_body())
        .to_request();
    let issued: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = issued["id"].as_str().expect("issue response has no id").to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/tickets/{id}/resend"))
        .insert_header(("x-api-key", TEST_ADMIN_KEY))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["credential_rendered"], false);
    assert_eq!(body["notified"], true);
    assert_eq!(notifier.count(), 1);

    let req = test::TestRequest::get().uri(&format!("/tickets/{id}")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn admin_listing_returns_tickets_newest_first() {
    let db = test_db().await;
    let app = tickets_app!(db, FakeRenderer { fail: false }, CountingNotifier::default());

    for name in ["Ana", "Benito"] {
        let mut payload = issue_body();
        payload["buyer_name"] = json!(name);
        let req = test::TestRequest::post()
            .uri("/tickets/issue")
            .insert_header(("x-api-key", TEST_ADMIN_KEY))
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/admin/tickets").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/admin/tickets").insert_header(("x-api-key", TEST_ADMIN_KEY)).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["tickets"].as_array().map(Vec::len), Some(2));
}
