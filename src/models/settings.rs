use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_SITE_NAME: &str = "Event Manager";
pub const DEFAULT_SITE_DESCRIPTION: &str = "Book your events";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            site_description: DEFAULT_SITE_DESCRIPTION.to_string(),
        }
    }
}
