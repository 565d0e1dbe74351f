use blt_common::{Pesos, Secret};
use boletera_engine::{db_types::PaymentRef, traits::PaymentRecord, SqliteDatabase, TicketDefaults};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::config::ServerOptions;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

pub async fn test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    std::fs::create_dir_all("../data").expect("Could not create test data directory");
    let url = format!("sqlite://../data/test_server_{}.db", rand::random::<u64>());
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to database");
    db.migrate().await.expect("Error running DB migrations");
    db
}

pub fn ticket_defaults() -> TicketDefaults {
    TicketDefaults {
        event_title: "Los Miserables".to_string(),
        function_id: "funcion-1".to_string(),
        function_label: "Sáb 6 Dic 18:00".to_string(),
        price: Pesos::from(25_000),
        currency: "MXN".to_string(),
    }
}

pub fn server_options() -> ServerOptions {
    ServerOptions {
        admin_api_key: Secret::new(TEST_ADMIN_KEY.to_string()),
        public_base_url: "http://localhost:8360".to_string(),
        notification_url: None,
        defaults: ticket_defaults(),
    }
}

pub fn approved_record(payment_ref: &PaymentRef) -> PaymentRecord {
    PaymentRecord {
        payment_ref: payment_ref.clone(),
        state: boletera_engine::traits::PaymentState::Approved,
        amount: Some(Pesos::from(25_000)),
        currency: Some("MXN".to_string()),
        payer_name: Some("Ana".to_string()),
        payer_email: Some("ana@example.com".to_string()),
        item_title: Some("Los Miserables".to_string()),
        function_id: Some("funcion-1".to_string()),
        function_label: Some("Sáb 6 Dic 18:00".to_string()),
        raw: serde_json::json!({"id": payment_ref.as_str(), "status": "approved"}),
    }
}
