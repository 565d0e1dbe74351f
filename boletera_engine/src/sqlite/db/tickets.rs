use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTicket, PaymentRef, Ticket, TicketId},
    traits::{InsertTicketResult, TicketDbError, UsedUpdate},
};

/// Insert the ticket, relying on the UNIQUE index on `payment_ref` to resolve races. When two
/// redelivered notifications insert concurrently, the database picks the single winner; the loser
/// lands here in the unique-violation arm and is handed the winner's row.
pub async fn insert_ticket(ticket: NewTicket, conn: &mut SqliteConnection) -> Result<InsertTicketResult, TicketDbError> {
    let id = ticket.id.clone().unwrap_or_else(TicketId::random);
    let now = Utc::now();
    let result = sqlx::query_as::<_, Ticket>(
        r#"
            INSERT INTO tickets (
                id,
                payment_ref,
                buyer_name,
                buyer_email,
                buyer_phone,
                event_title,
                function_id,
                function_label,
                price,
                currency,
                used,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(&id)
    .bind(&ticket.payment_ref)
    .bind(&ticket.buyer.name)
    .bind(&ticket.buyer.email)
    .bind(&ticket.buyer.phone)
    .bind(&ticket.details.event_title)
    .bind(&ticket.details.function_id)
    .bind(&ticket.details.function_label)
    .bind(ticket.details.price)
    .bind(&ticket.details.currency)
    .bind(false)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(ticket) => {
            debug!("🗃️ Ticket [{}] inserted", ticket.id);
            Ok(InsertTicketResult::Inserted(ticket))
        },
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let existing = match &ticket.payment_ref {
                Some(payment_ref) => fetch_ticket_by_payment_ref(payment_ref, conn).await?,
                None => None,
            };
            match existing {
                Some(existing) => {
                    debug!("🗃️ Ticket for payment already exists with id {}", existing.id);
                    Ok(InsertTicketResult::AlreadyExists(existing))
                },
                // A unique violation without a surviving row for the same payment_ref means the
                // generated id itself collided, which is not recoverable here.
                None => Err(TicketDbError::DatabaseError(db_err.to_string())),
            }
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_ticket_by_id(id: &TicketId, conn: &mut SqliteConnection) -> Result<Option<Ticket>, sqlx::Error> {
    let ticket =
        sqlx::query_as("SELECT * FROM tickets WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(ticket)
}

pub async fn fetch_ticket_by_payment_ref(
    payment_ref: &PaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Ticket>, TicketDbError> {
    let ticket = sqlx::query_as("SELECT * FROM tickets WHERE payment_ref = $1")
        .bind(payment_ref.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(ticket)
}

/// One-way used transition. The `used = 0` guard makes the update a no-op on already-used
/// tickets, so door-scanner double-taps report `changed: false` instead of flipping anything.
pub async fn mark_used(id: &TicketId, conn: &mut SqliteConnection) -> Result<Option<UsedUpdate>, TicketDbError> {
    let now = Utc::now();
    let changed = sqlx::query("UPDATE tickets SET used = 1, updated_at = $1 WHERE id = $2 AND used = 0")
        .bind(now)
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected() >
        0;
    if changed {
        debug!("🗃️ Ticket [{id}] marked as used");
    }
    let ticket = fetch_ticket_by_id(id, conn).await?;
    Ok(ticket.map(|ticket| UsedUpdate { ticket, changed }))
}

/// All tickets, newest first.
pub async fn fetch_all_tickets(conn: &mut SqliteConnection) -> Result<Vec<Ticket>, sqlx::Error> {
    let tickets = sqlx::query_as("SELECT * FROM tickets ORDER BY created_at DESC").fetch_all(conn).await?;
    Ok(tickets)
}
