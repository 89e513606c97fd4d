// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use smart_city_model::MeasurementRecord;

/// Errors reported by a [`MeasurementBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[cfg(feature = "firebase")]
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to start the client runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl BackendError {
    /// Whether the same request may succeed later, e.g. after a dropped connection.
    ///
    /// Permission errors, client errors and invalid request setups are final.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::PermissionDenied(_) | BackendError::Runtime(_) => false,
            BackendError::Status { status, .. } => *status >= 500 || *status == 429,
            #[cfg(feature = "firebase")]
            BackendError::Connection(e) => !e.is_builder(),
            BackendError::Malformed(_) | BackendError::Json(_) => true,
        }
    }
}

/// Reference to a live value in the realtime database, e.g. `data/humidity`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LiveRef(String);

impl LiveRef {
    pub fn new(path: &str) -> Self {
        Self(path.trim_matches('/').to_string())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

/// Reference to a collection in the document store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionRef(String);

impl CollectionRef {
    pub fn new(name: &str) -> Self {
        Self(name.trim_matches('/').to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

pub type ValueCallback = Box<dyn Fn(Option<f64>) + Send + Sync>;
pub type ErrorCallback = Box<dyn Fn(BackendError) + Send + Sync>;

/// Keeps a live subscription running. Dropping it cancels the subscription.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that has nothing to cancel.
    pub fn finished() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub type BackendPointer = Arc<dyn MeasurementBackend>;

/// The hosted services the dashboard reads from.
pub trait MeasurementBackend: Send + Sync {
    fn live_ref(&self, path: &str) -> LiveRef {
        LiveRef::new(path)
    }

    /// Subscribes to the value at `live_ref`.
    ///
    /// `on_value` is called once with the current value (`None` if there is none) and again on
    /// every change. `on_error` is called for every failure. After a transient one (see
    /// [`BackendError::is_transient`]) the subscription may resume, otherwise it has ended.
    fn subscribe_live(
        &self,
        live_ref: &LiveRef,
        on_value: ValueCallback,
        on_error: ErrorCallback,
    ) -> Subscription;

    fn collection(&self, name: &str) -> CollectionRef {
        CollectionRef::new(name)
    }

    /// Reads every document of `collection` at once.
    ///
    /// Blocks the calling thread, do not call this from the UI thread.
    fn fetch_all_documents(
        &self,
        collection: &CollectionRef,
    ) -> Result<Vec<MeasurementRecord>, BackendError>;
}

#[test]
fn test_subscription_cancels_on_drop() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    let subscription = Subscription::new(move || flag.store(true, Ordering::SeqCst));

    assert!(!cancelled.load(Ordering::SeqCst));
    drop(subscription);
    assert!(cancelled.load(Ordering::SeqCst));
}

#[test]
fn test_refs_trim_slashes() {
    assert_eq!(LiveRef::new("/data/humidity/").path(), "data/humidity");
    assert_eq!(CollectionRef::new("measurements").name(), "measurements");
}

#[test]
fn test_transient_errors() {
    let status = |status| BackendError::Status {
        url: "https://smart-city.firebaseio.com/data/humidity.json".into(),
        status,
    };

    assert!(status(503).is_transient());
    assert!(status(429).is_transient());
    assert!(!status(404).is_transient());
    assert!(!BackendError::PermissionDenied("permission_denied".into()).is_transient());
    assert!(BackendError::Malformed("truncated event".into()).is_transient());
}
