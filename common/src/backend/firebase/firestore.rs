// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Collection listing through the Firestore REST API.

use std::collections::HashMap;

use serde::Deserialize;
use smart_city_model::{MeasurementRecord, Timestamp};

use crate::backend::measurementbackend::BackendError;

pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Largest page the list endpoint hands out.
const PAGE_SIZE: u32 = 300;

/// A Firestore typed value.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(serde_json::Value),
    BooleanValue(bool),
    /// 64 bit integers are transported as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::IntegerValue(text) => text.parse::<i64>().ok().map(|v| v as f64),
            Value::DoubleValue(value) => Some(*value),
            Value::StringValue(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::IntegerValue(text) => text.parse().ok(),
            Value::DoubleValue(value) => Some(*value as i64),
            _ => None,
        }
    }

    /// Native timestamps and `{seconds, nanoseconds}` maps both count.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::TimestampValue(text) => {
                let parsed = chrono::DateTime::parse_from_rfc3339(text)
                    .map_err(|e| log::warn!("Invalid timestamp {text:?}: {e}"))
                    .ok()?;
                Some(Timestamp::new(
                    parsed.timestamp(),
                    parsed.timestamp_subsec_nanos() as i64,
                ))
            }
            Value::MapValue(map) => {
                let get = |key: &str| map.fields.get(key).and_then(Value::as_i64);
                Some(Timestamp::new(
                    get("seconds").unwrap_or_default(),
                    get("nanoseconds").unwrap_or_default(),
                ))
            }
            _ => None,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    /// The document as a measurement. Missing or non-numeric values stay empty.
    pub fn to_measurement(&self) -> MeasurementRecord {
        let number = |key: &str| {
            let value = self.fields.get(key).and_then(Value::as_f64);
            if value.is_none() {
                log::warn!("Document {} has no numeric {key}", self.name);
            }
            value
        };

        MeasurementRecord {
            humidity: number("humidity"),
            temperature: number("temperature"),
            timestamp: self.fields.get("timestamp").and_then(Value::as_timestamp),
        }
    }
}

/// One page of `documents.list`.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ListDocumentsResponse {
    /// Converts the page, one record per document.
    pub fn measurements(&self) -> Vec<MeasurementRecord> {
        self.documents.iter().map(Document::to_measurement).collect()
    }
}

pub fn collection_url(endpoint: &str, project_id: &str, collection: &str) -> String {
    format!(
        "{}/projects/{project_id}/databases/(default)/documents/{collection}",
        endpoint.trim_end_matches('/')
    )
}

/// Reads every page of the collection at `url`.
pub async fn list_documents(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
) -> Result<Vec<MeasurementRecord>, BackendError> {
    let mut measurements = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
        if !api_key.is_empty() {
            query.push(("key", api_key.to_string()));
        }
        if let Some(token) = page_token.take() {
            query.push(("pageToken", token));
        }

        log::info!("-> GET {url}");
        let response = http.get(url).query(&query).send().await?;

        let status = response.status();
        log::info!("<- {status}");
        if !status.is_success() {
            return Err(super::status_error(url, status));
        }

        let page: ListDocumentsResponse = response.json().await?;
        measurements.extend(page.measurements());

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    log::debug!("Read {} documents from {url}", measurements.len());
    Ok(measurements)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "documents": [
            {
                "name": "projects/smart-city/databases/(default)/documents/measurements/a",
                "fields": {
                    "humidity": {"integerValue": "50"},
                    "temperature": {"doubleValue": 20.5},
                    "timestamp": {"timestampValue": "2020-09-13T12:26:40.250Z"}
                },
                "createTime": "2020-09-13T12:26:41.000000Z",
                "updateTime": "2020-09-13T12:26:41.000000Z"
            },
            {
                "name": "projects/smart-city/databases/(default)/documents/measurements/b",
                "fields": {
                    "humidity": {"doubleValue": 51},
                    "temperature": {"integerValue": "21"},
                    "timestamp": {"mapValue": {"fields": {
                        "seconds": {"integerValue": "1600003600"},
                        "nanoseconds": {"integerValue": "0"}
                    }}}
                }
            },
            {
                "name": "projects/smart-city/databases/(default)/documents/measurements/c",
                "fields": {
                    "humidity": {"nullValue": null},
                    "note": {"stringValue": "sensor offline"}
                }
            }
        ],
        "nextPageToken": "next"
    }"#;

    #[test]
    fn test_decode_page() {
        let page: ListDocumentsResponse = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.documents.len(), 3);
        assert_eq!(page.next_page_token.as_deref(), Some("next"));

        let measurements = page.measurements();
        assert_eq!(
            measurements,
            vec![
                MeasurementRecord::new(
                    50.0,
                    20.5,
                    Some(Timestamp::new(1_600_000_000, 250_000_000))
                ),
                MeasurementRecord::new(51.0, 21.0, Some(Timestamp::new(1_600_003_600, 0))),
                MeasurementRecord::default(),
            ]
        );

        // Every document makes a row, missing values leave empty cells.
        let incomplete = &measurements[2];
        assert_eq!(incomplete.humidity_text(), "");
        assert_eq!(incomplete.temperature_text(), "");
        assert_eq!(incomplete.time_text(), "");
    }

    #[test]
    fn test_decode_empty_collection() {
        let page: ListDocumentsResponse = serde_json::from_str("{}").unwrap();
        assert!(page.measurements().is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_document_without_timestamp() {
        let document: Document = serde_json::from_str(
            r#"{"name": "x", "fields": {"humidity": {"integerValue": "40"}, "temperature": {"integerValue": "18"}}}"#,
        )
        .unwrap();

        let record = document.to_measurement();
        assert_eq!(record.timestamp, None);
        assert_eq!(record.time_text(), "");
    }

    #[test]
    fn test_collection_url() {
        assert_eq!(
            collection_url(FIRESTORE_ENDPOINT, "smart-city", "measurements"),
            "https://firestore.googleapis.com/v1/projects/smart-city/databases/(default)/documents/measurements"
        );
    }
}
