//! The booking transaction.
//!
//! A booking is checked against remaining tickets and inserted inside one
//! ledger transaction that holds the event locked, so two requests racing for
//! the last ticket cannot both observe it as free.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::availability::{self, Availability};
use super::clock::Clock;
use super::validation::Numeric;
use crate::ledger::{Ledger, LedgerError};
use crate::models::{Booking, BookingLine, BookingSummary, Event, TierCounts};

pub const ATTENDEE_NAME_MAX: usize = 100;

/// Why a booking request was turned away. Each variant is a distinct,
/// user-facing condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingRejection {
    #[error("Attendee name is required")]
    MissingAttendeeName,

    #[error("Please select at least one ticket")]
    NoTicketsSelected,

    #[error("Invalid ticket quantity")]
    InvalidQuantity,

    #[error("Event not found")]
    EventNotFound,

    #[error("Not enough tickets available")]
    InsufficientTickets {
        requested: TierCounts,
        remaining: Availability,
    },
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Rejected(#[from] BookingRejection),

    #[error(transparent)]
    Store(#[from] LedgerError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    pub attendee_name: Option<String>,
    pub full_price_tickets: Option<Value>,
    pub concession_tickets: Option<Value>,
}

/// A booking request that has passed input validation but not yet the
/// availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub event_id: Uuid,
    pub attendee_name: String,
    pub tickets: TierCounts,
}

impl BookingRequest {
    pub fn parse(event_id: Uuid, form: &BookingForm) -> Result<Self, BookingRejection> {
        let attendee_name = sanitize_attendee_name(form.attendee_name.as_deref());
        if attendee_name.is_empty() {
            return Err(BookingRejection::MissingAttendeeName);
        }

        let tickets = TierCounts::new(
            quantity(form.full_price_tickets.as_ref())?,
            quantity(form.concession_tickets.as_ref())?,
        );
        if tickets.is_empty() {
            return Err(BookingRejection::NoTicketsSelected);
        }
        if tickets.full_price < 0 || tickets.concession < 0 {
            return Err(BookingRejection::InvalidQuantity);
        }

        Ok(Self {
            event_id,
            attendee_name,
            tickets,
        })
    }
}

/// Trimmed, then cut to at most 100 characters.
pub fn sanitize_attendee_name(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .unwrap_or_default()
        .chars()
        .take(ATTENDEE_NAME_MAX)
        .collect()
}

fn quantity(value: Option<&Value>) -> Result<i64, BookingRejection> {
    let numeric = Numeric::from_value(value);
    match numeric {
        Numeric::Missing => Ok(0),
        Numeric::Invalid => Err(BookingRejection::InvalidQuantity),
        Numeric::Number(_) => numeric.whole().ok_or(BookingRejection::InvalidQuantity),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub event: Event,
    pub attendee_name: String,
    pub full_price_tickets: i64,
    pub concession_tickets: i64,
    pub total_cost: Decimal,
}

/// A published event as an attendee sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAvailability {
    pub event: Event,
    #[serde(flatten)]
    pub availability: Availability,
}

/// Every booking that still has an event, with totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingsReport {
    pub bookings: Vec<BookingLine>,
    pub summary: BookingSummary,
}

#[derive(Clone)]
pub struct BookingDesk {
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
}

impl BookingDesk {
    pub fn new(ledger: Arc<dyn Ledger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    /// Remaining tickets for display. Not locked: the figure may be stale by
    /// the time a booking is submitted, and [`BookingDesk::book`] re-checks.
    pub async fn availability(&self, event_id: Uuid) -> Result<EventAvailability, BookingError> {
        let event = self
            .ledger
            .find_event(event_id)
            .await?
            .filter(Event::is_published)
            .ok_or(BookingRejection::EventNotFound)?;
        let booked = self.ledger.booked_totals(event.id).await?;
        let availability = availability::remaining_for(&event, booked);
        if availability.is_over_capacity() {
            warn!(
                event_id = %event.id,
                full_price_remaining = availability.full_price_remaining,
                concession_remaining = availability.concession_remaining,
                "Event is booked beyond its capacity"
            );
        }

        Ok(EventAvailability {
            availability,
            event,
        })
    }

    pub async fn report(&self) -> Result<BookingsReport, BookingError> {
        Ok(BookingsReport {
            bookings: self.ledger.booking_lines().await?,
            summary: self.ledger.booking_summary().await?,
        })
    }

    /// Raw rows for an event id. The event itself is not looked up, so rows
    /// left behind by a deleted event are returned as they are.
    pub async fn bookings_for_event(&self, event_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        Ok(self.ledger.bookings_for_event(event_id).await?)
    }

    pub async fn book(
        &self,
        event_id: Uuid,
        form: &BookingForm,
    ) -> Result<BookingConfirmation, BookingError> {
        let request = match BookingRequest::parse(event_id, form) {
            Ok(request) => request,
            Err(rejection) => {
                info!(%event_id, reason = %rejection, "Booking request rejected");
                return Err(rejection.into());
            }
        };
        self.commit(request).await
    }

    /// Checks `request` against current availability and inserts it, all in
    /// one ledger transaction. Any rejection leaves the ledger untouched.
    pub async fn commit(&self, request: BookingRequest) -> Result<BookingConfirmation, BookingError> {
        let mut tx = self.ledger.begin().await?;

        let event = tx
            .lock_event(request.event_id)
            .await?
            .filter(Event::is_published)
            .ok_or(BookingRejection::EventNotFound)?;

        let booked = tx.booked_totals(event.id).await?;
        let remaining = availability::remaining_for(&event, booked);
        if !remaining.admits(request.tickets) {
            warn!(
                event_id = %event.id,
                requested_full = request.tickets.full_price,
                requested_concession = request.tickets.concession,
                remaining_full = remaining.full_price_remaining,
                remaining_concession = remaining.concession_remaining,
                "Booking exceeds remaining tickets"
            );
            return Err(BookingRejection::InsufficientTickets {
                requested: request.tickets,
                remaining,
            }
            .into());
        }

        // Admitted quantities are bounded by an i32 capacity.
        let booking = Booking {
            id: Uuid::new_v4(),
            event_id: event.id,
            attendee_name: request.attendee_name,
            full_price_tickets: i32::try_from(request.tickets.full_price)
                .map_err(|_| BookingRejection::InvalidQuantity)?,
            concession_tickets: i32::try_from(request.tickets.concession)
                .map_err(|_| BookingRejection::InvalidQuantity)?,
            booking_date: self.clock.now(),
        };
        tx.insert_booking(&booking).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            event_id = %event.id,
            full_price = booking.full_price_tickets,
            concession = booking.concession_tickets,
            "Booking committed"
        );

        Ok(BookingConfirmation {
            booking_id: booking.id,
            total_cost: event.cost_of(request.tickets),
            attendee_name: booking.attendee_name,
            full_price_tickets: request.tickets.full_price,
            concession_tickets: request.tickets.concession,
            event,
        })
    }
}
