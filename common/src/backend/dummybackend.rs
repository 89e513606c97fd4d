// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use serde::Deserialize;
use smart_city_model::MeasurementRecord;

use crate::backend::measurementbackend::{
    BackendError, CollectionRef, ErrorCallback, LiveRef, MeasurementBackend, Subscription,
    ValueCallback,
};

/// Serves a fixed set of values. Used when no Firebase project is configured.
#[derive(Deserialize, Default)]
pub struct DummyBackend {
    live: HashMap<String, Option<f64>>,
    measurements: Vec<MeasurementRecord>,
}

impl DummyBackend {
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./dummymeasurements.json");

        serde_json::from_str::<Self>(json_data)
    }
}

impl MeasurementBackend for DummyBackend {
    fn subscribe_live(
        &self,
        live_ref: &LiveRef,
        on_value: ValueCallback,
        _on_error: ErrorCallback,
    ) -> Subscription {
        // The values never change, so the initial delivery is all there is.
        on_value(self.live.get(live_ref.path()).copied().flatten());
        Subscription::finished()
    }

    fn fetch_all_documents(
        &self,
        collection: &CollectionRef,
    ) -> Result<Vec<MeasurementRecord>, BackendError> {
        log::debug!("Serving dummy documents for {}", collection.name());
        Ok(self.measurements.clone())
    }
}

#[test]
fn test_dummy_backend() {
    use std::sync::{Arc, Mutex};

    let backend = DummyBackend::new().unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let _subscription = backend.subscribe_live(
        &backend.live_ref("data/humidity"),
        Box::new(move |value| sink.lock().unwrap().push(value)),
        Box::new(|e| panic!("unexpected error: {e}")),
    );
    assert_eq!(*received.lock().unwrap(), vec![Some(48.0)]);

    let records = backend
        .fetch_all_documents(&backend.collection(smart_city_model::MEASUREMENTS_COLLECTION))
        .unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].humidity_text(), "50%");
    assert_eq!(records[0].temperature_text(), "20°C");
}

#[test]
fn test_dummy_backend_unknown_path() {
    let backend = DummyBackend::new().unwrap();

    let received = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = received.clone();
    let _subscription = backend.subscribe_live(
        &backend.live_ref("data/pressure"),
        Box::new(move |value| sink.lock().unwrap().push(value)),
        Box::new(|_| {}),
    );
    assert_eq!(*received.lock().unwrap(), vec![None]);
}
