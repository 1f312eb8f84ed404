pub mod sharepoint;
pub mod snapshot;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::record::{FieldDescriptor, FieldType, Record};

pub use sharepoint::{SharePointOptions, SharePointSource};
pub use snapshot::SnapshotSource;

pub const DEFAULT_MAX_RECORDS: usize = 5000;
pub const MODIFIED_FIELD: &str = "Modified";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordOrder {
    #[default]
    Unordered,
    CreatedDescending,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response shape: {reason}")]
    Shape { reason: String },

    #[error("failed to read snapshot {path}: {source}")]
    Snapshot {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build http client: {reason}")]
    Client { reason: String },
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch_fields(&self, list_name: &str) -> Result<Vec<FieldDescriptor>, FetchError>;

    async fn fetch_records(
        &self,
        list_name: &str,
        order: RecordOrder,
    ) -> Result<Vec<Record>, FetchError>;
}

fn value_array(body: Value, key: &str) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(FetchError::Shape {
                reason: format!("'{key}' is not an array but {}", json_kind(&other)),
            }),
            None => Err(FetchError::Shape {
                reason: format!("missing '{key}' array"),
            }),
        },
        other => Err(FetchError::Shape {
            reason: format!("expected an object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn decode_records(body: Value) -> Result<Vec<Record>, FetchError> {
    value_array(body, "value")?
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            Record::from_json(item).ok_or_else(|| FetchError::Shape {
                reason: format!("item {idx} is not an object"),
            })
        })
        .collect()
}

pub fn decode_fields(body: Value) -> Result<Vec<FieldDescriptor>, FetchError> {
    value_array(body, "value")?
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|source| FetchError::Decode { source }))
        .collect()
}

pub fn with_modified_field(mut fields: Vec<FieldDescriptor>) -> Vec<FieldDescriptor> {
    fields.push(FieldDescriptor::new(
        MODIFIED_FIELD,
        MODIFIED_FIELD,
        FieldType::DateTime,
    ));
    fields
}
