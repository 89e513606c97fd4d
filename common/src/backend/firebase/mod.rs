// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod firestore;
mod realtime;

#[cfg(test)]
mod testserver;

use smart_city_model::MeasurementRecord;

use crate::backend::measurementbackend::{
    BackendError, CollectionRef, ErrorCallback, LiveRef, MeasurementBackend, Subscription,
    ValueCallback,
};
use crate::config::FirebaseConfig;

/// Client for the Realtime Database and Firestore of one Firebase project.
///
/// Live subscriptions run as tasks on the client's own runtime, so callbacks arrive on
/// runtime threads.
pub struct FirebaseClient {
    config: FirebaseConfig,
    firestore_endpoint: String,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl FirebaseClient {
    const WORKER_THREADS: usize = 2;

    pub fn new(config: FirebaseConfig) -> Result<Self, BackendError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(Self::WORKER_THREADS)
            .thread_name("firebase")
            .enable_all()
            .build()?;
        let http = reqwest::Client::builder().build()?;

        log::info!(
            "Firebase client for project {:?} at {:?}",
            config.project_id,
            config.database_url
        );

        Ok(Self {
            config,
            firestore_endpoint: firestore::FIRESTORE_ENDPOINT.to_string(),
            http,
            runtime,
        })
    }

    /// Uses `endpoint` instead of the public Firestore API, e.g. a local emulator.
    pub fn with_firestore_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.firestore_endpoint = endpoint.into();
        self
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    /// REST location of the value at `live_ref`.
    pub fn live_url(&self, live_ref: &LiveRef) -> String {
        format!(
            "{}/{}.json",
            self.config.database_url.trim_end_matches('/'),
            live_ref.path()
        )
    }

    pub fn collection_url(&self, collection: &CollectionRef) -> String {
        firestore::collection_url(
            &self.firestore_endpoint,
            &self.config.project_id,
            collection.name(),
        )
    }
}

impl MeasurementBackend for FirebaseClient {
    fn subscribe_live(
        &self,
        live_ref: &LiveRef,
        on_value: ValueCallback,
        on_error: ErrorCallback,
    ) -> Subscription {
        let url = self.live_url(live_ref);
        let task = self
            .runtime
            .spawn(realtime::watch(self.http.clone(), url, on_value, on_error));

        let handle = task.abort_handle();
        Subscription::new(move || handle.abort())
    }

    fn fetch_all_documents(
        &self,
        collection: &CollectionRef,
    ) -> Result<Vec<MeasurementRecord>, BackendError> {
        let url = self.collection_url(collection);
        self.runtime
            .block_on(firestore::list_documents(&self.http, &url, &self.config.api_key))
    }
}

fn status_error(url: &str, status: reqwest::StatusCode) -> BackendError {
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            BackendError::PermissionDenied(format!("{url} answered {status}"))
        }
        _ => BackendError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        },
    }
}
