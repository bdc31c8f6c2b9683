//! Remaining-ticket arithmetic.
//!
//! Pure functions of capacity and booked totals. Nothing here clamps: a
//! negative remainder means the ledger is over capacity, and callers get to
//! see that.

use serde::Serialize;

use crate::models::{Event, TierCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub full_price_remaining: i64,
    pub concession_remaining: i64,
}

impl Availability {
    /// Whether `requested` fits in what is left, tier by tier.
    pub fn admits(&self, requested: TierCounts) -> bool {
        requested.full_price <= self.full_price_remaining
            && requested.concession <= self.concession_remaining
    }

    pub fn is_over_capacity(&self) -> bool {
        self.full_price_remaining < 0 || self.concession_remaining < 0
    }
}

pub fn remaining(capacity: TierCounts, booked: TierCounts) -> Availability {
    Availability {
        full_price_remaining: capacity.full_price - booked.full_price,
        concession_remaining: capacity.concession - booked.concession,
    }
}

pub fn remaining_for(event: &Event, booked: TierCounts) -> Availability {
    remaining(event.capacity(), booked)
}
