use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;

use super::{
    decode_fields, decode_records, with_modified_field, FetchError, RecordOrder, RecordSource,
    DEFAULT_MAX_RECORDS,
};
use crate::record::{FieldDescriptor, Record};

const NOMETADATA_JSON: &str = "application/json;odata=nometadata";
const FIELD_FILTER: &str = "Hidden eq false and ReadOnlyField eq false and InternalName ne 'Attachments' and InternalName ne 'ContentType' and InternalName ne 'ContentTypeId'";
const FIELD_SELECT: &str = "InternalName,Title,TypeAsString";

#[derive(Clone, Debug)]
pub struct SharePointOptions {
    pub site_url: String,
    pub proxy: Option<String>,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub max_records: usize,
}

impl Default for SharePointOptions {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            proxy: None,
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(10),
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

pub struct SharePointSource {
    client: reqwest::Client,
    site_url: String,
    max_records: usize,
}

fn quote_list_name(list_name: &str) -> String {
    list_name.replace('\'', "''")
}

fn list_url(site_url: &str, list_name: &str) -> String {
    format!(
        "{}/_api/web/lists/GetByTitle('{}')",
        site_url.trim().trim_end_matches('/'),
        quote_list_name(list_name)
    )
}

pub fn fields_url(site_url: &str, list_name: &str) -> String {
    format!(
        "{}/Fields?$filter={FIELD_FILTER}&$select={FIELD_SELECT}",
        list_url(site_url, list_name)
    )
}

pub fn items_url(site_url: &str, list_name: &str, order: RecordOrder, max_records: usize) -> String {
    let base = list_url(site_url, list_name);
    match order {
        RecordOrder::Unordered => format!("{base}/items?$top={max_records}"),
        RecordOrder::CreatedDescending => {
            format!("{base}/items?$orderby=Created desc&$top={max_records}")
        }
    }
}

impl SharePointSource {
    pub fn new(options: SharePointOptions) -> Result<Self, FetchError> {
        let site_url = options.site_url.trim().to_string();
        reqwest::Url::parse(&site_url).map_err(|e| FetchError::Client {
            reason: format!("invalid site URL '{site_url}': {e}"),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(NOMETADATA_JSON));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("listboard/", env!("CARGO_PKG_VERSION"))),
        );
        for (key, value) in options.headers.iter() {
            headers.insert(key.clone(), value.clone());
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout);
        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| FetchError::Client {
                reason: format!("could not set up proxy: {e}"),
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|e| FetchError::Client {
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            site_url,
            max_records: options.max_records.max(1),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!(url, "requesting list data");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = resp.bytes().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { source })
    }
}

#[async_trait]
impl RecordSource for SharePointSource {
    fn describe(&self) -> String {
        self.site_url.clone()
    }

    async fn fetch_fields(&self, list_name: &str) -> Result<Vec<FieldDescriptor>, FetchError> {
        let body = self.get_json(&fields_url(&self.site_url, list_name)).await?;
        Ok(with_modified_field(decode_fields(body)?))
    }

    async fn fetch_records(
        &self,
        list_name: &str,
        order: RecordOrder,
    ) -> Result<Vec<Record>, FetchError> {
        let url = items_url(&self.site_url, list_name, order, self.max_records);
        let records = decode_records(self.get_json(&url).await?)?;
        tracing::debug!(count = records.len(), list = list_name, "records fetched");
        Ok(records)
    }
}
