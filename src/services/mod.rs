pub mod availability;
pub mod booking;
pub mod clock;
pub mod lifecycle;
pub mod settings;
pub mod validation;

pub use availability::Availability;
pub use booking::{
    BookingConfirmation, BookingDesk, BookingError, BookingForm, BookingRejection,
    BookingsReport, EventAvailability,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use lifecycle::{EventBoard, EventLifecycle, LifecycleError};
pub use settings::{SettingsError, SiteSettingsService};
pub use validation::{EventForm, FieldError, SettingsForm};
