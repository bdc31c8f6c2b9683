use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::TierCounts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub event_id: Uuid,
    pub attendee_name: String,
    pub full_price_tickets: i32,
    pub concession_tickets: i32,
    pub booking_date: DateTime<Utc>,
}

impl Booking {
    pub fn tickets(&self) -> TierCounts {
        TierCounts::new(
            i64::from(self.full_price_tickets),
            i64::from(self.concession_tickets),
        )
    }
}

/// A booking joined to the event it was made against, as shown in the
/// organiser's bookings ledger.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BookingLine {
    pub booking_id: Uuid,
    pub attendee_name: String,
    pub full_price_tickets: i32,
    pub concession_tickets: i32,
    pub booking_date: DateTime<Utc>,
    pub event_title: String,
    pub event_date: Option<DateTime<Utc>>,
    pub total_cost: Decimal,
}

impl BookingLine {
    pub fn tickets(&self) -> TierCounts {
        TierCounts::new(
            i64::from(self.full_price_tickets),
            i64::from(self.concession_tickets),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BookingSummary {
    pub total_bookings: i64,
    pub total_tickets: i64,
    pub total_revenue: Decimal,
}

impl BookingSummary {
    pub fn from_lines(lines: &[BookingLine]) -> Self {
        Self {
            total_bookings: lines.len() as i64,
            total_tickets: lines
                .iter()
                .map(|line| line.tickets().total())
                .sum(),
            total_revenue: lines.iter().map(|line| line.total_cost).sum(),
        }
    }
}
