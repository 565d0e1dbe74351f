use boletera_engine::SqliteDatabase;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Fresh file-backed database per test. In-memory SQLite gives every pooled connection its own
/// database, which would defeat the whole point of the concurrency tests.
pub fn random_db_path() -> String {
    format!("sqlite://../data/test_store_{}.db", rand::random::<u64>())
}

pub async fn prepare_test_db(url: &str) -> SqliteDatabase {
    dotenvy::dotenv().ok();
    let _ = env_logger::try_init();
    std::fs::create_dir_all("../data").expect("Could not create test data directory");
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}
