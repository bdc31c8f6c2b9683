use std::ops::Add;

use serde::Serialize;

pub mod booking;
pub mod event;
pub mod settings;

pub use booking::{Booking, BookingLine, BookingSummary};
pub use event::{Event, EventFields, EventSales, EventStatus};
pub use settings::SiteSettings;

/// A pair of ticket counts, one per tier.
///
/// Used for capacities, booked totals and requested quantities alike. Signed so
/// that an over-capacity state can be represented instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub full_price: i64,
    pub concession: i64,
}

impl TierCounts {
    pub const ZERO: TierCounts = TierCounts {
        full_price: 0,
        concession: 0,
    };

    pub const fn new(full_price: i64, concession: i64) -> Self {
        Self {
            full_price,
            concession,
        }
    }

    pub fn total(&self) -> i64 {
        self.full_price + self.concession
    }

    pub fn is_empty(&self) -> bool {
        self.full_price == 0 && self.concession == 0
    }
}

impl Add for TierCounts {
    type Output = TierCounts;

    fn add(self, other: TierCounts) -> TierCounts {
        TierCounts::new(
            self.full_price + other.full_price,
            self.concession + other.concession,
        )
    }
}
