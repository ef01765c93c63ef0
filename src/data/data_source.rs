//! Data sources delivering the raw record batch
//!
//! The grid only needs `fetch_all`; the HTTP source is the one the binary
//! uses, the static source backs tests and demos.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use crate::data::record::{json_value_to_field_value, Record};
use crate::error::{GridError, GridResult};

/// One raw record as served by the comment feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub body: String,
    /// Everything else in the payload (postId, message, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRecord {
    pub fn new(id: i64, name: &str, email: &str, body: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            body: body.to_string(),
            extra: Map::new(),
        }
    }
}

/// Provider of the full, ordered record batch
pub trait DataSource: Send + Sync {
    fn fetch_all(&self) -> impl Future<Output = GridResult<Vec<RawRecord>>> + Send;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}

/// Derived age, computed once at load time from the record id (20..=25)
pub fn derived_age(id: i64) -> i64 {
    20 + id.rem_euclid(6)
}

/// Map a raw record to a grid record.
///
/// The comment text lands in `body`: the payload body, or the payload's own
/// `message` when the body is empty. `age` is derived from the id.
pub fn to_record(raw: &RawRecord) -> Record {
    let body = match raw.extra.get("message").and_then(Value::as_str) {
        Some(message) if raw.body.is_empty() => message,
        _ => raw.body.as_str(),
    };

    let mut record = Record::new(raw.id)
        .with_field("id", raw.id)
        .with_field("name", raw.name.as_str())
        .with_field("email", raw.email.as_str())
        .with_field("body", body)
        .with_field("age", derived_age(raw.id));

    for (name, value) in &raw.extra {
        if let Some(value) = json_value_to_field_value(value) {
            record.fields.entry(name.clone()).or_insert(value);
        }
    }

    record
}

pub fn to_records(raw: &[RawRecord]) -> Vec<Record> {
    raw.iter().map(to_record).collect()
}

/// Fetches the batch as a JSON array over HTTP
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    url: String,
    client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(url: &str, timeout: Duration) -> GridResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GridError::LoadFailed(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DataSource for HttpDataSource {
    async fn fetch_all(&self) -> GridResult<Vec<RawRecord>> {
        info!("HttpDataSource: GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GridError::LoadFailed(format!("request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(GridError::LoadFailed(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let records: Vec<RawRecord> = response
            .json()
            .await
            .map_err(|e| GridError::LoadFailed(format!("invalid payload from {}: {}", self.url, e)))?;
        debug!("HttpDataSource: received {} records", records.len());
        Ok(records)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Serves a fixed batch, optionally after a delay or as a failure
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    records: Vec<RawRecord>,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl StaticDataSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            delay: None,
            failure: None,
        }
    }

    /// Parse a JSON array of raw records
    pub fn from_json(json: &str) -> GridResult<Self> {
        let records: Vec<RawRecord> = serde_json::from_str(json)
            .map_err(|e| GridError::LoadFailed(format!("invalid JSON batch: {}", e)))?;
        Ok(Self::new(records))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl DataSource for StaticDataSource {
    async fn fetch_all(&self) -> GridResult<Vec<RawRecord>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(GridError::LoadFailed(message.clone())),
            None => Ok(self.records.clone()),
        }
    }

    fn describe(&self) -> String {
        format!("static batch of {} records", self.records.len())
    }
}
