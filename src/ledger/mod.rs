//! The ticket ledger: storage of events, bookings and site settings.
//!
//! The ledger holds facts only. Deciding whether a booking fits, or whether an
//! event may move to another state, lives in `crate::services`. The one piece
//! of concurrency discipline the ledger owns is [`LedgerTx`]: a unit of work in
//! which the event row is locked, so a check against booked totals and the
//! insert that follows it cannot interleave with another booking for the same
//! event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Booking, BookingLine, BookingSummary, Event, EventFields, EventSales, EventStatus,
    SiteSettings, TierCounts,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedger;
pub use postgres::PgLedger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transaction already finished")]
    TransactionFinished,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn insert_event(&self, event: &Event) -> Result<()>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>>;

    /// Overwrites the seven business fields. Returns the updated row, or `None`
    /// when no event has this id.
    async fn update_event_fields(
        &self,
        id: Uuid,
        fields: &EventFields,
        modified_at: DateTime<Utc>,
    ) -> Result<Option<Event>>;

    /// Moves a draft to published. Returns `None` when there is no draft with
    /// this id (missing, or already published).
    async fn publish_draft(&self, id: Uuid, published_at: DateTime<Utc>) -> Result<Option<Event>>;

    /// Hard delete. Bookings referencing the event are left in place.
    async fn delete_event(&self, id: Uuid) -> Result<bool>;

    /// Published events ordered by event date, earliest first.
    async fn list_published(&self) -> Result<Vec<Event>>;

    /// Events in `status` with their sold counts. Published events come back
    /// ordered by event date, drafts newest first.
    async fn list_with_sales(&self, status: EventStatus) -> Result<Vec<EventSales>>;

    /// Sum of booked tickets per tier; zero when there are no bookings.
    async fn booked_totals(&self, event_id: Uuid) -> Result<TierCounts>;

    /// Raw booking rows for an event id, whether or not the event still exists.
    async fn bookings_for_event(&self, event_id: Uuid) -> Result<Vec<Booking>>;

    /// Bookings joined to their events, newest booking first.
    async fn booking_lines(&self) -> Result<Vec<BookingLine>>;

    async fn booking_summary(&self) -> Result<BookingSummary>;

    async fn load_settings(&self) -> Result<Option<SiteSettings>>;

    async fn save_settings(&self, settings: &SiteSettings) -> Result<()>;

    async fn begin(&self) -> Result<Box<dyn LedgerTx>>;
}

/// A unit of work against the ledger.
///
/// Dropping a transaction without calling [`LedgerTx::commit`] discards every
/// write made through it.
#[async_trait]
pub trait LedgerTx: Send {
    /// Loads the event and holds it against concurrent bookings until the
    /// transaction ends.
    async fn lock_event(&mut self, id: Uuid) -> Result<Option<Event>>;

    async fn booked_totals(&mut self, event_id: Uuid) -> Result<TierCounts>;

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;
}
