use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::traits::{PaymentEventRecord, TicketDbError};

/// Append-only audit trail. Redelivered notifications produce one row each; that is deliberate,
/// since the trail is how an operator reconstructs what the provider actually sent.
pub async fn insert_event(event: PaymentEventRecord, conn: &mut SqliteConnection) -> Result<(), TicketDbError> {
    let raw = event.raw.to_string();
    sqlx::query(
        r#"
            INSERT INTO payment_events (payment_ref, status, payer_email, raw_json, received_at)
            VALUES ($1, $2, $3, $4, $5);
        "#,
    )
    .bind(event.payment_ref.as_str())
    .bind(&event.status)
    .bind(&event.payer_email)
    .bind(raw)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    trace!("🗃️ Payment event for [{}] recorded ({})", event.payment_ref, event.status);
    Ok(())
}
