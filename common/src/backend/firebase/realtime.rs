// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Realtime Database streaming over server-sent events.

use serde::Deserialize;

use crate::backend::measurementbackend::{BackendError, ErrorCallback, ValueCallback};

/// Delay before reopening a stream that was closed or interrupted.
const RECONNECT_DELAY: std::time::Duration = if cfg!(test) {
    std::time::Duration::from_millis(50)
} else {
    std::time::Duration::from_secs(2)
};

/// One event of a `text/event-stream` response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` parser. Chunks may split lines anywhere.
#[derive(Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
    current: ServerEvent,
    has_fields: bool,
}

impl EventStreamParser {
    /// Feeds a chunk of the response body and returns the events it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if self.has_fields {
                    events.push(std::mem::take(&mut self.current));
                    self.has_fields = false;
                }
                continue;
            }

            // Comment line
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => self.current.event = value.to_string(),
                "data" => {
                    if !self.current.data.is_empty() {
                        self.current.data.push('\n');
                    }
                    self.current.data.push_str(value);
                }
                _ => {}
            }
            self.has_fields = true;
        }

        events
    }
}

#[derive(Deserialize)]
struct PathData {
    path: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Decoded Realtime Database stream event.
#[derive(Debug, PartialEq)]
pub enum RealtimeEvent {
    Put { path: String, data: serde_json::Value },
    Patch { path: String, data: serde_json::Value },
    KeepAlive,
    Cancel(String),
    AuthRevoked,
    Unknown(String),
}

impl RealtimeEvent {
    pub fn decode(event: &ServerEvent) -> Result<Self, BackendError> {
        Ok(match event.event.as_str() {
            "put" => {
                let PathData { path, data } = serde_json::from_str(&event.data)?;
                Self::Put { path, data }
            }
            "patch" => {
                let PathData { path, data } = serde_json::from_str(&event.data)?;
                Self::Patch { path, data }
            }
            "keep-alive" => Self::KeepAlive,
            "cancel" => Self::Cancel(event.data.trim_matches('"').to_string()),
            "auth_revoked" => Self::AuthRevoked,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Interprets a live payload as a number.
///
/// Numeric strings are accepted, anything else counts as no value.
pub fn scalar_value(data: &serde_json::Value) -> Option<f64> {
    match data {
        serde_json::Value::Null => None,
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => match text.trim().parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring non-numeric live value {text:?}");
                None
            }
        },
        other => {
            log::warn!("Ignoring non-scalar live value {other}");
            None
        }
    }
}

/// Streams `url` until it fails, delivering each new value to `on_value`.
pub async fn watch(
    http: reqwest::Client,
    url: String,
    on_value: ValueCallback,
    on_error: ErrorCallback,
) {
    loop {
        match stream_once(&http, &url, &on_value).await {
            Ok(()) => log::debug!("Stream {url} closed by server, reconnecting"),
            Err(e) if e.is_transient() => {
                log::debug!("Stream {url} interrupted: {e}, reconnecting");
                on_error(e);
            }
            Err(e) => {
                log::debug!("Stream {url} failed: {e}");
                on_error(e);
                return;
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Applies one stream event to a scalar subscription.
pub fn dispatch(event: &ServerEvent, on_value: &ValueCallback) -> Result<(), BackendError> {
    match RealtimeEvent::decode(event)? {
        RealtimeEvent::Put { path, data } if path == "/" => {
            log::debug!("New value: {data}");
            on_value(scalar_value(&data));
        }
        RealtimeEvent::Put { path, data } | RealtimeEvent::Patch { path, data } => {
            log::debug!("Ignoring nested update {data} at {path}");
        }
        RealtimeEvent::KeepAlive => {}
        RealtimeEvent::Cancel(reason) => return Err(BackendError::PermissionDenied(reason)),
        RealtimeEvent::AuthRevoked => {
            return Err(BackendError::PermissionDenied("auth revoked".into()))
        }
        RealtimeEvent::Unknown(name) => log::debug!("Ignoring stream event {name:?}"),
    }

    Ok(())
}

async fn stream_once(
    http: &reqwest::Client,
    url: &str,
    on_value: &ValueCallback,
) -> Result<(), BackendError> {
    log::info!("-> GET {url} (stream)");
    let mut response = http
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    let status = response.status();
    log::info!("<- {status}");
    if !status.is_success() {
        return Err(super::status_error(url, status));
    }

    let mut parser = EventStreamParser::default();
    while let Some(chunk) = response.chunk().await? {
        for event in parser.feed(&chunk) {
            dispatch(&event, on_value)?;
        }
    }

    Ok(())
}
