use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use thiserror::Error;

use crate::record::{self, FieldDescriptor, FieldType, FieldValue, Record};

const LOCALE_DATETIME: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unparsable date-time value '{raw}'")]
    InvalidDateTime { raw: String },

    #[error("failed to serialize structured value: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

pub fn locale_datetime<Tz>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant
        .with_timezone(tz)
        .format(LOCALE_DATETIME)
        .to_string()
}

pub fn datetime_instant(value: &FieldValue) -> Result<DateTime<Utc>, FormatError> {
    let parsed = match value {
        FieldValue::Text(raw) | FieldValue::DateText(raw) => record::parse_datetime(raw),
        FieldValue::Number(ms) if ms.is_finite() => Utc.timestamp_millis_opt(*ms as i64).single(),
        _ => None,
    };
    parsed.ok_or_else(|| FormatError::InvalidDateTime {
        raw: value.to_string(),
    })
}

pub fn format_datetime(value: &FieldValue) -> Result<String, FormatError> {
    datetime_instant(value).map(|instant| locale_datetime(&instant, &Local))
}

fn user_identifier(value: &FieldValue) -> String {
    match value {
        FieldValue::Reference(r) => r
            .id()
            .map(|id| id.to_string())
            .or_else(|| r.display_name())
            .unwrap_or_default(),
        FieldValue::ReferenceList(items) => items
            .iter()
            .filter_map(|r| r.id().map(|id| id.to_string()))
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

// Multi-value lookups show a single representative value.
fn lookup_display(value: &FieldValue) -> String {
    match value {
        FieldValue::Reference(r) => r.display_name().unwrap_or_default(),
        FieldValue::ReferenceList(items) => items
            .first()
            .and_then(|r| r.display_name())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn structured_display(value: &FieldValue) -> Result<String, FormatError> {
    match value {
        FieldValue::Reference(r) => match r.title().or_else(|| r.text()).or_else(|| r.name()) {
            Some(shown) => Ok(shown),
            None => serde_json::to_string(r.body()).map_err(|source| FormatError::Serialize { source }),
        },
        FieldValue::ReferenceList(_) | FieldValue::List(_) => serde_json::to_string(&value.to_json())
            .map_err(|source| FormatError::Serialize { source }),
        other => Ok(other.to_string()),
    }
}

pub fn format_value(value: &FieldValue, field_type: &FieldType) -> Result<String, FormatError> {
    if value.is_absent() {
        return Ok(String::new());
    }
    match field_type {
        FieldType::DateTime => format_datetime(value),
        FieldType::User => Ok(user_identifier(value)),
        FieldType::Lookup | FieldType::LookupMulti => Ok(lookup_display(value)),
        FieldType::Text | FieldType::Other(_) => structured_display(value),
    }
}

pub fn display_value(record: &Record, field: &FieldDescriptor) -> String {
    let Some(value) = record.resolve_field(field) else {
        return String::new();
    };
    match format_value(value, &field.field_type) {
        Ok(shown) => shown,
        Err(e) => {
            tracing::debug!(field = %field.internal_name, error = %e, "cell formatting failed");
            String::new()
        }
    }
}
