use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::record::{self, FieldValue, Record};

use super::SortDirection;

fn rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Bool(_) => 0,
        FieldValue::Number(_) => 1,
        FieldValue::Text(_) | FieldValue::DateText(_) => 2,
        FieldValue::Reference(_) => 3,
        FieldValue::ReferenceList(_) | FieldValue::List(_) => 4,
        FieldValue::Null => 5,
    }
}

// Parseable timestamps order by instant ahead of all other text.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum TextKey<'a> {
    Instant(DateTime<Utc>, &'a str),
    Plain(&'a str),
}

fn text_key(value: &FieldValue) -> Option<TextKey<'_>> {
    match value {
        FieldValue::DateText(raw) => Some(match record::parse_datetime(raw) {
            Some(instant) => TextKey::Instant(instant, raw),
            None => TextKey::Plain(raw),
        }),
        FieldValue::Text(raw) => Some(TextKey::Plain(raw)),
        _ => None,
    }
}

fn compare_present(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Number(x), FieldValue::Number(y)) => x.total_cmp(y),
        (FieldValue::Bool(x), FieldValue::Bool(y)) => x.cmp(y),
        (
            FieldValue::Text(_) | FieldValue::DateText(_),
            FieldValue::Text(_) | FieldValue::DateText(_),
        ) => text_key(a).cmp(&text_key(b)),
        (FieldValue::Reference(x), FieldValue::Reference(y)) => {
            x.display_name().cmp(&y.display_name())
        }
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_json().to_string().cmp(&b.to_json().to_string())),
    }
}

// Absent values order after everything else when ascending.
pub fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    let a = a.filter(|v| !matches!(v, FieldValue::Null));
    let b = b.filter(|v| !matches!(v, FieldValue::Null));
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

pub fn sort_records<'a>(
    records: &'a [Record],
    field: &str,
    direction: SortDirection,
) -> Vec<&'a Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by(|a, b| {
        let ord = compare_values(a.get(field), b.get(field));
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted
}
