//! `SqliteDatabase` is the concrete SQLite backend for the ticket engine. It implements the
//! [`TicketDatabase`] trait and nothing else; the flows in [`crate::api`] never see SQL.
use std::fmt::Debug;

use sqlx::SqlitePool;

use super::db::{new_pool, payment_events, tickets};
use crate::{
    db_types::{NewTicket, PaymentRef, Ticket, TicketId},
    traits::{InsertTicketResult, PaymentEventRecord, TicketDatabase, TicketDbError, UsedUpdate},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, TicketDbError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the schema up to date. Called once at server startup and from test setup.
    pub async fn migrate(&self) -> Result<(), TicketDbError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| TicketDbError::DatabaseError(e.to_string()))
    }
}

impl TicketDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<InsertTicketResult, TicketDbError> {
        let mut conn = self.pool.acquire().await?;
        tickets::insert_ticket(ticket, &mut conn).await
    }

    async fn fetch_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, TicketDbError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::fetch_ticket_by_id(id, &mut conn).await?;
        Ok(ticket)
    }

    async fn fetch_ticket_by_payment_ref(&self, payment_ref: &PaymentRef) -> Result<Option<Ticket>, TicketDbError> {
        let mut conn = self.pool.acquire().await?;
        tickets::fetch_ticket_by_payment_ref(payment_ref, &mut conn).await
    }

    async fn mark_ticket_used(&self, id: &TicketId) -> Result<Option<UsedUpdate>, TicketDbError> {
        let mut conn = self.pool.acquire().await?;
        tickets::mark_used(id, &mut conn).await
    }

    async fn fetch_all_tickets(&self) -> Result<Vec<Ticket>, TicketDbError> {
        let mut conn = self.pool.acquire().await?;
        let tickets = tickets::fetch_all_tickets(&mut conn).await?;
        Ok(tickets)
    }

    async fn record_payment_event(&self, event: PaymentEventRecord) -> Result<(), TicketDbError> {
        let mut conn = self.pool.acquire().await?;
        payment_events::insert_event(event, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), TicketDbError> {
        self.pool.close().await;
        Ok(())
    }
}
