use std::sync::Arc;

use crate::auth::AccessGate;
use crate::config::Environment;
use crate::ledger::Ledger;
use crate::services::{BookingDesk, Clock, EventLifecycle, SiteSettingsService};

/// Everything a handler can reach. The ledger is shared by the services; no
/// component holds it as a global.
#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingDesk,
    pub lifecycle: EventLifecycle,
    pub settings: SiteSettingsService,
    pub gate: AccessGate,
    pub environment: Environment,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
        gate: AccessGate,
        environment: Environment,
    ) -> Self {
        Self {
            bookings: BookingDesk::new(Arc::clone(&ledger), Arc::clone(&clock)),
            lifecycle: EventLifecycle::new(Arc::clone(&ledger), clock),
            settings: SiteSettingsService::new(ledger),
            gate,
            environment,
        }
    }
}
