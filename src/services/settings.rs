use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::validation::{validate_settings, FieldError, SettingsForm};
use crate::ledger::{Ledger, LedgerError};
use crate::models::SiteSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Invalid(#[from] FieldError),

    #[error(transparent)]
    Store(#[from] LedgerError),
}

#[derive(Clone)]
pub struct SiteSettingsService {
    ledger: Arc<dyn Ledger>,
}

impl SiteSettingsService {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Stored settings, or the defaults when none have been saved.
    pub async fn current(&self) -> Result<SiteSettings, SettingsError> {
        Ok(self.ledger.load_settings().await?.unwrap_or_default())
    }

    pub async fn update(&self, form: &SettingsForm) -> Result<SiteSettings, SettingsError> {
        let settings = validate_settings(form)?;
        self.ledger.save_settings(&settings).await?;

        info!(site_name = %settings.site_name, "Site settings updated");
        Ok(settings)
    }
}
