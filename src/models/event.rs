use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::TierCounts;

pub const PLACEHOLDER_TITLE: &str = "New Event";
pub const PLACEHOLDER_DESCRIPTION: &str = "Event description";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub event_date: Option<DateTime<Utc>>,
    pub full_price_tickets: i32,
    pub full_price_cost: Decimal,
    pub concession_tickets: i32,
    pub concession_cost: Decimal,
    pub status: EventStatus,
    pub created_date: DateTime<Utc>,
    pub published_date: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
}

impl Event {
    /// A fresh draft holding placeholder values. Nothing here is expected to be
    /// publishable until an edit has gone through validation.
    pub fn draft(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: PLACEHOLDER_TITLE.to_string(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            event_date: None,
            full_price_tickets: 0,
            full_price_cost: Decimal::ZERO,
            concession_tickets: 0,
            concession_cost: Decimal::ZERO,
            status: EventStatus::Draft,
            created_date: now,
            published_date: None,
            last_modified: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == EventStatus::Published
    }

    pub fn capacity(&self) -> TierCounts {
        TierCounts::new(
            i64::from(self.full_price_tickets),
            i64::from(self.concession_tickets),
        )
    }

    /// Price of `tickets` at this event's current tier costs.
    pub fn cost_of(&self, tickets: TierCounts) -> Decimal {
        self.full_price_cost * Decimal::from(tickets.full_price)
            + self.concession_cost * Decimal::from(tickets.concession)
    }

    pub fn apply(&mut self, fields: &EventFields, modified_at: DateTime<Utc>) {
        self.title = fields.title.clone();
        self.description = fields.description.clone();
        self.event_date = Some(fields.event_date);
        self.full_price_tickets = fields.full_price_tickets;
        self.full_price_cost = fields.full_price_cost;
        self.concession_tickets = fields.concession_tickets;
        self.concession_cost = fields.concession_cost;
        self.last_modified = modified_at;
    }
}

/// The seven business fields an organiser edit replaces as one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFields {
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub full_price_tickets: i32,
    pub full_price_cost: Decimal,
    pub concession_tickets: i32,
    pub concession_cost: Decimal,
}

/// An event row together with how many tickets of each tier have been sold.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct EventSales {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub full_sold: i64,
    pub concession_sold: i64,
}
