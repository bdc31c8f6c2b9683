use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Ledger, LedgerTx, Result};
use crate::models::{
    Booking, BookingLine, BookingSummary, Event, EventFields, EventSales, EventStatus,
    SiteSettings, TierCounts,
};

#[derive(Debug, Default)]
struct LedgerState {
    events: HashMap<Uuid, Event>,
    bookings: Vec<Booking>,
    settings: Option<SiteSettings>,
}

impl LedgerState {
    fn booked_totals(&self, event_id: Uuid) -> TierCounts {
        self.bookings
            .iter()
            .filter(|booking| booking.event_id == event_id)
            .fold(TierCounts::ZERO, |acc, booking| acc + booking.tickets())
    }

    fn booking_lines(&self) -> Vec<BookingLine> {
        let mut lines: Vec<BookingLine> = self
            .bookings
            .iter()
            .filter_map(|booking| {
                let event = self.events.get(&booking.event_id)?;
                Some(BookingLine {
                    booking_id: booking.id,
                    attendee_name: booking.attendee_name.clone(),
                    full_price_tickets: booking.full_price_tickets,
                    concession_tickets: booking.concession_tickets,
                    booking_date: booking.booking_date,
                    event_title: event.title.clone(),
                    event_date: event.event_date,
                    total_cost: event.cost_of(booking.tickets()),
                })
            })
            .collect();
        lines.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        lines
    }
}

/// A ledger held in process memory.
///
/// Every operation, including a whole [`LedgerTx`], runs under one mutex, so
/// transactions are fully serialised. Suitable for tests and single-process
/// demos.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut state = self.state.lock().await;
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let state = self.state.lock().await;
        Ok(state.events.get(&id).cloned())
    }

    async fn update_event_fields(
        &self,
        id: Uuid,
        fields: &EventFields,
        modified_at: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        let mut state = self.state.lock().await;
        Ok(state.events.get_mut(&id).map(|event| {
            event.apply(fields, modified_at);
            event.clone()
        }))
    }

    async fn publish_draft(&self, id: Uuid, published_at: DateTime<Utc>) -> Result<Option<Event>> {
        let mut state = self.state.lock().await;
        Ok(state
            .events
            .get_mut(&id)
            .filter(|event| event.status == EventStatus::Draft)
            .map(|event| {
                event.status = EventStatus::Published;
                event.published_date = Some(published_at);
                event.clone()
            }))
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state.events.remove(&id).is_some())
    }

    async fn list_published(&self) -> Result<Vec<Event>> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|event| event.is_published())
            .cloned()
            .collect();
        sort_by_event_date(&mut events, |event| event);
        Ok(events)
    }

    async fn list_with_sales(&self, status: EventStatus) -> Result<Vec<EventSales>> {
        let state = self.state.lock().await;
        let mut rows: Vec<EventSales> = state
            .events
            .values()
            .filter(|event| event.status == status)
            .map(|event| {
                let sold = state.booked_totals(event.id);
                EventSales {
                    event: event.clone(),
                    full_sold: sold.full_price,
                    concession_sold: sold.concession,
                }
            })
            .collect();

        match status {
            EventStatus::Published => sort_by_event_date(&mut rows, |row| &row.event),
            EventStatus::Draft => {
                rows.sort_by(|a, b| b.event.created_date.cmp(&a.event.created_date))
            }
        }
        Ok(rows)
    }

    async fn booked_totals(&self, event_id: Uuid) -> Result<TierCounts> {
        let state = self.state.lock().await;
        Ok(state.booked_totals(event_id))
    }

    async fn bookings_for_event(&self, event_id: Uuid) -> Result<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .iter()
            .filter(|booking| booking.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn booking_lines(&self) -> Result<Vec<BookingLine>> {
        let state = self.state.lock().await;
        Ok(state.booking_lines())
    }

    async fn booking_summary(&self) -> Result<BookingSummary> {
        let state = self.state.lock().await;
        Ok(BookingSummary::from_lines(&state.booking_lines()))
    }

    async fn load_settings(&self) -> Result<Option<SiteSettings>> {
        let state = self.state.lock().await;
        Ok(state.settings.clone())
    }

    async fn save_settings(&self, settings: &SiteSettings) -> Result<()> {
        let mut state = self.state.lock().await;
        state.settings = Some(settings.clone());
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(InMemoryLedgerTx {
            state: guard,
            staged: Vec::new(),
        }))
    }
}

/// Holds the ledger mutex for its whole lifetime. Inserts are staged and only
/// become visible on commit.
pub struct InMemoryLedgerTx {
    state: OwnedMutexGuard<LedgerState>,
    staged: Vec<Booking>,
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn lock_event(&mut self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.state.events.get(&id).cloned())
    }

    async fn booked_totals(&mut self, event_id: Uuid) -> Result<TierCounts> {
        let staged = self
            .staged
            .iter()
            .filter(|booking| booking.event_id == event_id)
            .fold(TierCounts::ZERO, |acc, booking| acc + booking.tickets());
        Ok(self.state.booked_totals(event_id) + staged)
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        self.staged.push(booking.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        self.state.bookings.extend(staged);
        Ok(())
    }
}

/// Earliest event date first; events without a date sort last.
fn sort_by_event_date<T>(items: &mut [T], event: fn(&T) -> &Event) {
    items.sort_by(|a, b| match (event(a).event_date, event(b).event_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
