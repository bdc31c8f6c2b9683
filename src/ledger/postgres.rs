use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{Ledger, LedgerError, LedgerTx, Result};
use crate::models::{
    Booking, BookingLine, BookingSummary, Event, EventFields, EventSales, EventStatus,
    SiteSettings, TierCounts,
};

const EVENT_COLUMNS: &str = "id, title, description, event_date, \
    full_price_tickets, full_price_cost, concession_tickets, concession_cost, \
    status, created_date, published_date, last_modified";

const BOOKED_TOTALS: &str = "SELECT COALESCE(SUM(full_price_tickets), 0)::BIGINT, \
    COALESCE(SUM(concession_tickets), 0)::BIGINT \
    FROM bookings WHERE event_id = $1";

const INSERT_BOOKING: &str = "INSERT INTO bookings \
    (id, event_id, attendee_name, full_price_tickets, concession_tickets, booking_date) \
    VALUES ($1, $2, $3, $4, $5, $6)";

#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO events ({EVENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(event.full_price_tickets)
        .bind(event.full_price_cost)
        .bind(event.concession_tickets)
        .bind(event.concession_cost)
        .bind(event.status)
        .bind(event.created_date)
        .bind(event.published_date)
        .bind(event.last_modified)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn update_event_fields(
        &self,
        id: Uuid,
        fields: &EventFields,
        modified_at: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET title = $2, description = $3, event_date = $4, \
             full_price_tickets = $5, full_price_cost = $6, \
             concession_tickets = $7, concession_cost = $8, last_modified = $9 \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.event_date)
        .bind(fields.full_price_tickets)
        .bind(fields.full_price_cost)
        .bind(fields.concession_tickets)
        .bind(fields.concession_cost)
        .bind(modified_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn publish_draft(&self, id: Uuid, published_at: DateTime<Utc>) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET status = 'published', published_date = $2 \
             WHERE id = $1 AND status = 'draft' RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(published_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_published(&self) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE status = 'published' ORDER BY event_date ASC NULLS LAST"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn list_with_sales(&self, status: EventStatus) -> Result<Vec<EventSales>> {
        let order = match status {
            EventStatus::Published => "e.event_date ASC NULLS LAST",
            EventStatus::Draft => "e.created_date DESC",
        };

        let rows = sqlx::query_as::<_, EventSales>(&format!(
            "SELECT e.id, e.title, e.description, e.event_date, \
                    e.full_price_tickets, e.full_price_cost, \
                    e.concession_tickets, e.concession_cost, \
                    e.status, e.created_date, e.published_date, e.last_modified, \
                    COALESCE(SUM(b.full_price_tickets), 0)::BIGINT AS full_sold, \
                    COALESCE(SUM(b.concession_tickets), 0)::BIGINT AS concession_sold \
             FROM events e \
             LEFT JOIN bookings b ON b.event_id = e.id \
             WHERE e.status = $1 \
             GROUP BY e.id \
             ORDER BY {order}"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn booked_totals(&self, event_id: Uuid) -> Result<TierCounts> {
        let (full_price, concession): (i64, i64) = sqlx::query_as(BOOKED_TOTALS)
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(TierCounts::new(full_price, concession))
    }

    async fn bookings_for_event(&self, event_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT id, event_id, attendee_name, full_price_tickets, concession_tickets, booking_date \
             FROM bookings WHERE event_id = $1 ORDER BY booking_date ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn booking_lines(&self) -> Result<Vec<BookingLine>> {
        let lines = sqlx::query_as::<_, BookingLine>(
            "SELECT b.id AS booking_id, b.attendee_name, \
                    b.full_price_tickets, b.concession_tickets, b.booking_date, \
                    e.title AS event_title, e.event_date, \
                    (b.full_price_tickets * e.full_price_cost \
                        + b.concession_tickets * e.concession_cost) AS total_cost \
             FROM bookings b \
             JOIN events e ON b.event_id = e.id \
             ORDER BY b.booking_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn booking_summary(&self) -> Result<BookingSummary> {
        let summary = sqlx::query_as::<_, BookingSummary>(
            "SELECT COUNT(*) AS total_bookings, \
                    COALESCE(SUM(b.full_price_tickets + b.concession_tickets), 0)::BIGINT \
                        AS total_tickets, \
                    COALESCE(SUM(b.full_price_tickets * e.full_price_cost \
                        + b.concession_tickets * e.concession_cost), 0) AS total_revenue \
             FROM bookings b \
             JOIN events e ON b.event_id = e.id",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    async fn load_settings(&self) -> Result<Option<SiteSettings>> {
        let settings = sqlx::query_as::<_, SiteSettings>(
            "SELECT site_name, site_description FROM site_settings WHERE setting_id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn save_settings(&self, settings: &SiteSettings) -> Result<()> {
        sqlx::query(
            "INSERT INTO site_settings (setting_id, site_name, site_description) \
             VALUES (1, $1, $2) \
             ON CONFLICT (setting_id) DO UPDATE \
             SET site_name = EXCLUDED.site_name, site_description = EXCLUDED.site_description",
        )
        .bind(&settings.site_name)
        .bind(&settings.site_description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx: Some(tx) }))
    }
}

/// A Postgres transaction. `lock_event` takes a row lock with
/// `SELECT ... FOR UPDATE`, which serialises bookings per event under the
/// default read-committed isolation.
pub struct PgLedgerTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgLedgerTx {
    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or(LedgerError::TransactionFinished)
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_event(&mut self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;

        Ok(event)
    }

    async fn booked_totals(&mut self, event_id: Uuid) -> Result<TierCounts> {
        let (full_price, concession): (i64, i64) = sqlx::query_as(BOOKED_TOTALS)
            .bind(event_id)
            .fetch_one(self.conn()?)
            .await?;

        Ok(TierCounts::new(full_price, concession))
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        sqlx::query(INSERT_BOOKING)
            .bind(booking.id)
            .bind(booking.event_id)
            .bind(&booking.attendee_name)
            .bind(booking.full_price_tickets)
            .bind(booking.concession_tickets)
            .bind(booking.booking_date)
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(LedgerError::TransactionFinished)?;
        tx.commit().await?;
        Ok(())
    }
}
