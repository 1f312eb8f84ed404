use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use super::{decode_fields, decode_records, FetchError, RecordOrder, RecordSource};
use crate::grid::{sort_records, SortDirection, DEFAULT_SORT_FIELD};
use crate::record::{FieldDescriptor, Record};

#[derive(Clone, Debug)]
pub struct SnapshotSource {
    path: PathBuf,
    max_records: usize,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>, max_records: usize) -> Self {
        Self {
            path: path.into(),
            max_records: max_records.max(1),
        }
    }

    async fn load(&self) -> Result<Value, FetchError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Snapshot {
                path: self.path.display().to_string(),
                source,
            })?;
        serde_json::from_str(&raw).map_err(|source| FetchError::Decode { source })
    }
}

fn take_section(body: Value, key: &str) -> Option<Value> {
    match body {
        Value::Object(mut map) => map.remove(key).map(|items| {
            let mut envelope = serde_json::Map::new();
            envelope.insert("value".to_string(), items);
            Value::Object(envelope)
        }),
        _ => None,
    }
}

#[async_trait]
impl RecordSource for SnapshotSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_fields(&self, _list_name: &str) -> Result<Vec<FieldDescriptor>, FetchError> {
        match take_section(self.load().await?, "fields") {
            Some(fields) => decode_fields(fields),
            None => {
                tracing::debug!(path = %self.path.display(), "snapshot has no field descriptors");
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_records(
        &self,
        _list_name: &str,
        order: RecordOrder,
    ) -> Result<Vec<Record>, FetchError> {
        let body = self.load().await?;
        let has_items = matches!(&body, Value::Object(map) if map.contains_key("items"));
        let items = if has_items {
            take_section(body, "items")
        } else {
            Some(body)
        };
        let mut records = match items {
            Some(items) => decode_records(items)?,
            None => Vec::new(),
        };

        if order == RecordOrder::CreatedDescending {
            records = sort_records(&records, DEFAULT_SORT_FIELD, SortDirection::Descending)
                .into_iter()
                .cloned()
                .collect();
        }
        records.truncate(self.max_records);
        Ok(records)
    }
}
