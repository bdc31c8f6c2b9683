//! Draft → published → deleted.
//!
//! Creation always yields a draft with placeholder values. Edits replace all
//! seven business fields at once or not at all. Publishing is one-way and does
//! not re-check that the fields were ever edited away from their placeholders.
//! Deletion is a hard delete that leaves any bookings behind.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::clock::Clock;
use super::validation::{validate_event, EventForm, FieldError};
use crate::ledger::{Ledger, LedgerError};
use crate::models::{Event, EventSales, EventStatus};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Event not found")]
    NotFound,

    #[error(transparent)]
    Invalid(#[from] FieldError),

    #[error("Event is already published")]
    AlreadyPublished,

    #[error(transparent)]
    Store(#[from] LedgerError),
}

/// Organiser view of every event, split by status.
#[derive(Debug, Clone, Serialize)]
pub struct EventBoard {
    pub published_events: Vec<EventSales>,
    pub draft_events: Vec<EventSales>,
}

#[derive(Clone)]
pub struct EventLifecycle {
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
}

impl EventLifecycle {
    pub fn new(ledger: Arc<dyn Ledger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    pub async fn create_draft(&self) -> Result<Event, LifecycleError> {
        let event = Event::draft(Uuid::new_v4(), self.clock.now());
        self.ledger.insert_event(&event).await?;

        info!(event_id = %event.id, "Draft event created");
        Ok(event)
    }

    /// Any event regardless of status.
    pub async fn get(&self, id: Uuid) -> Result<Event, LifecycleError> {
        self.ledger
            .find_event(id)
            .await?
            .ok_or(LifecycleError::NotFound)
    }

    pub async fn edit(&self, id: Uuid, form: &EventForm) -> Result<Event, LifecycleError> {
        let now = self.clock.now();
        let fields = validate_event(form, now).map_err(|err| {
            info!(event_id = %id, field = err.field, reason = %err, "Event edit rejected");
            err
        })?;

        let event = self
            .ledger
            .update_event_fields(id, &fields, now)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        info!(event_id = %id, status = event.status.as_str(), "Event edited");
        Ok(event)
    }

    pub async fn publish(&self, id: Uuid) -> Result<Event, LifecycleError> {
        if let Some(event) = self.ledger.publish_draft(id, self.clock.now()).await? {
            info!(event_id = %id, "Event published");
            return Ok(event);
        }

        match self.ledger.find_event(id).await? {
            Some(_) => Err(LifecycleError::AlreadyPublished),
            None => Err(LifecycleError::NotFound),
        }
    }

    /// Bookings against the event are not checked and stay in the ledger.
    pub async fn delete(&self, id: Uuid) -> Result<(), LifecycleError> {
        if !self.ledger.delete_event(id).await? {
            return Err(LifecycleError::NotFound);
        }

        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    pub async fn list_published(&self) -> Result<Vec<Event>, LifecycleError> {
        Ok(self.ledger.list_published().await?)
    }

    pub async fn board(&self) -> Result<EventBoard, LifecycleError> {
        Ok(EventBoard {
            published_events: self.ledger.list_with_sales(EventStatus::Published).await?,
            draft_events: self.ledger.list_with_sales(EventStatus::Draft).await?,
        })
    }
}
