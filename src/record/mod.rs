use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const SOURCE_PREFIX: &str = "OData_";
pub const IDENTIFIER_SUFFIX: &str = "Id";

fn iso_datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$")
            .expect("static regex")
    })
}

pub fn looks_like_datetime(raw: &str) -> bool {
    iso_datetime_re().is_match(raw.trim())
}

// Offset-less date-times are local wall-clock time, bare dates are UTC midnight.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{n}")
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reference {
    body: Map<String, Value>,
}

impl Reference {
    pub fn new(body: Map<String, Value>) -> Self {
        Self { body }
    }

    fn prop(&self, key: &str) -> Option<String> {
        match self.body.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => n.as_f64().map(format_number),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.prop("Title")
    }

    pub fn lookup_value(&self) -> Option<String> {
        self.prop("lookupValue")
    }

    pub fn text(&self) -> Option<String> {
        self.prop("text")
    }

    pub fn name(&self) -> Option<String> {
        self.prop("name")
    }

    pub fn id(&self) -> Option<i64> {
        ["Id", "ID", "lookupId"]
            .iter()
            .filter_map(|key| self.body.get(*key))
            .find_map(|v| v.as_i64())
    }

    pub fn display_name(&self) -> Option<String> {
        self.title().or_else(|| self.lookup_value())
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    DateText(String),
    Reference(Reference),
    ReferenceList(Vec<Reference>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Value::String(s) if looks_like_datetime(&s) => Self::DateText(s),
            Value::String(s) => Self::Text(s),
            Value::Object(map) => Self::Reference(Reference::new(map)),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                Self::ReferenceList(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Object(map) => Some(Reference::new(map)),
                            _ => None,
                        })
                        .collect(),
                )
            }
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Value::from(*n as i64)
            }
            Self::Number(n) => Value::from(*n),
            Self::Text(s) | Self::DateText(s) => Value::String(s.clone()),
            Self::Reference(r) => r.to_json(),
            Self::ReferenceList(items) => Value::Array(items.iter().map(Reference::to_json).collect()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::DateText(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::from_json(Value::String(value.to_string()))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) | Self::DateText(s) => f.write_str(s),
            Self::Reference(r) => match r.display_name() {
                Some(name) => f.write_str(&name),
                None => write!(f, "{}", r.to_json()),
            },
            Self::ReferenceList(items) => {
                let names: Vec<String> = items
                    .iter()
                    .map(|r| r.display_name().unwrap_or_default())
                    .collect();
                f.write_str(&names.join(","))
            }
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    DateTime,
    User,
    Lookup,
    LookupMulti,
    Other(String),
}

impl FieldType {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Text" => Self::Text,
            "DateTime" => Self::DateTime,
            "User" => Self::User,
            "Lookup" => Self::Lookup,
            "LookupMulti" => Self::LookupMulti,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "Text",
            Self::DateTime => "DateTime",
            Self::User => "User",
            Self::Lookup => "Lookup",
            Self::LookupMulti => "LookupMulti",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "InternalName")]
    pub internal_name: String,
    #[serde(rename = "Title")]
    pub display_title: String,
    #[serde(rename = "TypeAsString")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(internal_name: &str, display_title: &str, field_type: FieldType) -> Self {
        Self {
            internal_name: internal_name.to_string(),
            display_title: display_title.to_string(),
            field_type,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from_json(v)))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    fn present(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).filter(|v| !v.is_absent())
    }

    // Canonical name first, then the prefixed alias, skipping values `blank` rejects.
    pub fn resolve_by(
        &self,
        name: &str,
        blank: impl Fn(&FieldValue) -> bool,
    ) -> Option<&FieldValue> {
        let keep = |v: &&FieldValue| !blank(v);
        self.get(name)
            .filter(keep)
            .or_else(|| self.get(&format!("{SOURCE_PREFIX}{name}")).filter(keep))
    }

    pub fn resolve_field(&self, field: &FieldDescriptor) -> Option<&FieldValue> {
        let name = field.internal_name.as_str();
        if let Some(value) = self.present(name) {
            return Some(value);
        }
        if field.field_type == FieldType::User {
            if let Some(value) = self.present(&format!("{name}{IDENTIFIER_SUFFIX}")) {
                return Some(value);
            }
        }
        let alias = self.present(&format!("{SOURCE_PREFIX}{name}"));
        if alias.is_none() {
            tracing::trace!(field = name, "field not resolvable on record");
        }
        alias
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_json_shapes() {
        let record = Record::from_json(json!({
            "Id": 7,
            "Title": "Kettle",
            "Created": "2024-03-01T08:15:00Z",
            "Approved": true,
            "Owner": {"Title": "Dana", "Id": 12},
            "Tags": [{"lookupValue": "a"}, {"lookupValue": "b"}],
            "Choices": ["x", "y"],
            "Missing": null
        }))
        .unwrap();

        assert_eq!(record.get("Id"), Some(&FieldValue::Number(7.0)));
        assert_eq!(record.get("Title"), Some(&FieldValue::Text("Kettle".into())));
        assert!(matches!(record.get("Created"), Some(FieldValue::DateText(_))));
        assert_eq!(record.get("Approved"), Some(&FieldValue::Bool(true)));
        assert!(matches!(record.get("Owner"), Some(FieldValue::Reference(r)) if r.id() == Some(12)));
        assert!(matches!(record.get("Tags"), Some(FieldValue::ReferenceList(v)) if v.len() == 2));
        assert!(matches!(record.get("Choices"), Some(FieldValue::List(v)) if v.len() == 2));
        assert_eq!(record.get("Missing"), Some(&FieldValue::Null));
    }

    fn resolved<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
        record
            .resolve_by(name, FieldValue::is_absent)
            .and_then(FieldValue::as_str)
    }

    #[test]
    fn resolve_prefers_canonical_then_prefixed_alias() {
        let record = Record::new()
            .with("Status", "Open")
            .with("OData_Status", "Closed")
            .with("OData_Phase", "Draft");
        assert_eq!(resolved(&record, "Status"), Some("Open"));
        assert_eq!(resolved(&record, "Phase"), Some("Draft"));
        assert!(record.resolve_by("Nope", FieldValue::is_absent).is_none());
    }

    #[test]
    fn empty_text_counts_as_absent() {
        let record = Record::new().with("Status", "").with("OData_Status", "Open");
        assert_eq!(resolved(&record, "Status"), Some("Open"));
    }

    #[test]
    fn user_fields_fall_back_to_identifier_alias() {
        let field = FieldDescriptor::new("Editor", "Editor", FieldType::User);
        let record = Record::new().with("EditorId", 42i64);
        assert_eq!(record.resolve_field(&field), Some(&FieldValue::Number(42.0)));

        let text = FieldDescriptor::new("Editor", "Editor", FieldType::Text);
        assert!(record.resolve_field(&text).is_none());
    }

    #[test]
    fn descriptors_decode_from_wire_names() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "InternalName": "Due",
            "Title": "Due date",
            "TypeAsString": "DateTime"
        }))
        .unwrap();
        assert_eq!(field.field_type, FieldType::DateTime);

        let other: FieldType = serde_json::from_value(json!("Choice")).unwrap();
        assert_eq!(other, FieldType::Other("Choice".to_string()));
    }

    #[test]
    fn parses_common_datetime_shapes() {
        assert!(parse_datetime("2024-03-01T08:15:00Z").is_some());
        assert!(parse_datetime("2024-03-01T08:15:00.123+02:00").is_some());
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("yesterday").is_none());
        assert!(!looks_like_datetime("2024"));
    }

    #[test]
    fn numbers_render_in_shortest_form() {
        assert_eq!(FieldValue::Number(42.0).to_string(), "42");
        assert_eq!(FieldValue::Number(1.5).to_string(), "1.5");
        assert_eq!(FieldValue::Number(42.0).to_json(), json!(42));
    }
}
