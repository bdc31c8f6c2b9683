//! Typed boundary between request payloads and the services.
//!
//! Payload structs accept loosely typed input (numbers may arrive as JSON
//! numbers or numeric strings) and are turned into validated values here.
//! Each validator reports the first failing field.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{EventFields, SiteSettings};

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const SITE_NAME_MAX: usize = 100;
pub const SITE_DESCRIPTION_MAX: usize = 500;
pub const CAPACITY_MAX: i64 = 10_000;

const COST_MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
const COST_MAX: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub full_price_tickets: Option<Value>,
    pub full_price_cost: Option<Value>,
    pub concession_tickets: Option<Value>,
    pub concession_cost: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    pub site_name: Option<String>,
    pub site_description: Option<String>,
}

/// A loosely typed numeric input after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Missing,
    Invalid,
    Number(Decimal),
}

impl Numeric {
    /// Missing, null and blank strings are all `Missing`.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Numeric::Missing,
            Some(Value::Number(number)) => {
                let parsed = match number.as_i64() {
                    Some(int) => Some(Decimal::from(int)),
                    None => number.as_f64().and_then(|float| Decimal::try_from(float).ok()),
                };
                parsed.map_or(Numeric::Invalid, Numeric::Number)
            }
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Numeric::Missing;
                }
                Decimal::from_str(trimmed)
                    .or_else(|_| Decimal::from_scientific(trimmed))
                    .map_or(Numeric::Invalid, Numeric::Number)
            }
            Some(_) => Numeric::Invalid,
        }
    }

    /// The value as a whole number, if it is one.
    pub fn whole(&self) -> Option<i64> {
        match self {
            Numeric::Number(number) if number.fract().is_zero() => number.to_i64(),
            _ => None,
        }
    }
}

pub fn validate_event(form: &EventForm, now: DateTime<Utc>) -> Result<EventFields, FieldError> {
    let title = required_text(form.title.as_deref(), "title", "Event title", TITLE_MAX)?;
    let description = required_text(
        form.description.as_deref(),
        "description",
        "Event description",
        DESCRIPTION_MAX,
    )?;
    let event_date = future_date(form.event_date.as_deref(), now)?;
    let full_price_tickets = capacity(
        form.full_price_tickets.as_ref(),
        "full_price_tickets",
        "full price",
    )?;
    let full_price_cost = cost(
        form.full_price_cost.as_ref(),
        "full_price_cost",
        "Full price ticket cost",
    )?;
    let concession_tickets = capacity(
        form.concession_tickets.as_ref(),
        "concession_tickets",
        "concession",
    )?;
    let concession_cost = cost(
        form.concession_cost.as_ref(),
        "concession_cost",
        "Concession ticket cost",
    )?;

    Ok(EventFields {
        title,
        description,
        event_date,
        full_price_tickets,
        full_price_cost,
        concession_tickets,
        concession_cost,
    })
}

pub fn validate_settings(form: &SettingsForm) -> Result<SiteSettings, FieldError> {
    Ok(SiteSettings {
        site_name: required_text(
            form.site_name.as_deref(),
            "site_name",
            "Site name",
            SITE_NAME_MAX,
        )?,
        site_description: required_text(
            form.site_description.as_deref(),
            "site_description",
            "Site description",
            SITE_DESCRIPTION_MAX,
        )?,
    })
}

fn required_text(
    value: Option<&str>,
    field: &'static str,
    label: &str,
    max: usize,
) -> Result<String, FieldError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, format!("{label} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(FieldError::new(
            field,
            format!("{label} must be less than {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn future_date(value: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>, FieldError> {
    const FIELD: &str = "event_date";

    let raw = value.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(FieldError::new(FIELD, "Event date is required"));
    }
    let date = parse_datetime(raw)
        .ok_or_else(|| FieldError::new(FIELD, "Please enter a valid date and time"))?;
    if date <= now {
        return Err(FieldError::new(FIELD, "Event date must be in the future"));
    }
    Ok(date)
}

/// RFC 3339, or a zone-less ISO date/datetime taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn capacity(value: Option<&Value>, field: &'static str, tier: &str) -> Result<i32, FieldError> {
    let numeric = Numeric::from_value(value);
    let count = match numeric {
        Numeric::Missing => {
            return Err(FieldError::new(
                field,
                format!("Number of {tier} tickets is required"),
            ))
        }
        Numeric::Invalid => {
            return Err(FieldError::new(
                field,
                format!("Number of {tier} tickets must be a number"),
            ))
        }
        Numeric::Number(_) => numeric.whole().ok_or_else(|| {
            FieldError::new(
                field,
                format!("Number of {tier} tickets must be a whole number"),
            )
        })?,
    };

    if count < 1 {
        return Err(FieldError::new(
            field,
            format!("Must have at least 1 {tier} ticket"),
        ));
    }
    if count > CAPACITY_MAX {
        return Err(FieldError::new(
            field,
            format!("Cannot have more than 10,000 {tier} tickets"),
        ));
    }
    i32::try_from(count).map_err(|_| {
        FieldError::new(
            field,
            format!("Cannot have more than 10,000 {tier} tickets"),
        )
    })
}

fn cost(value: Option<&Value>, field: &'static str, label: &str) -> Result<Decimal, FieldError> {
    let amount = match Numeric::from_value(value) {
        Numeric::Missing => return Err(FieldError::new(field, format!("{label} is required"))),
        Numeric::Invalid => {
            return Err(FieldError::new(field, format!("{label} must be a number")))
        }
        Numeric::Number(amount) => {
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        }
    };

    if amount < COST_MIN {
        return Err(FieldError::new(
            field,
            format!("{label} must be at least $0.01"),
        ));
    }
    if amount > COST_MAX {
        return Err(FieldError::new(
            field,
            format!("{label} cannot exceed $99,999.99"),
        ));
    }
    Ok(amount)
}
