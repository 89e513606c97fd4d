use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use smart_city_common::backend::{
    BackendError, CollectionRef, ErrorCallback, LiveRef, MeasurementBackend, Subscription,
    ValueCallback,
};
use smart_city_common::dashboard::{Dashboard, DashboardView};
use smart_city_common::model::{HistoryPanel, MeasurementRecord, Timestamp, ViewState};

type Callbacks = Arc<(ValueCallback, ErrorCallback)>;

/// In-memory backend that lets the test push values and control fetch outcomes.
#[derive(Default)]
struct FakeBackend {
    values: Mutex<HashMap<String, Option<f64>>>,
    subscribers: Arc<Mutex<HashMap<String, Callbacks>>>,
    documents: Mutex<Option<Vec<MeasurementRecord>>>,
    fetches: AtomicUsize,
    cancelled: Arc<AtomicUsize>,
    gate: Mutex<Option<Receiver<()>>>,
}

impl FakeBackend {
    fn with_documents(documents: Vec<MeasurementRecord>) -> Self {
        let backend = Self::default();
        *backend.documents.lock().unwrap() = Some(documents);
        backend
    }

    /// Makes the next fetch wait until the returned sender fires.
    fn hold_next_fetch(&self) -> Sender<()> {
        let (tx, rx) = channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    fn push(&self, path: &str, value: Option<f64>) {
        self.values.lock().unwrap().insert(path.into(), value);
        // Called without holding the lock, like callbacks arriving on separate runtime threads.
        let callbacks = self.subscribers.lock().unwrap().get(path).cloned();
        if let Some(callbacks) = callbacks {
            (callbacks.0)(value);
        }
    }

    fn fail(&self, path: &str, reason: &str) {
        let callbacks = self.subscribers.lock().unwrap().remove(path);
        if let Some(callbacks) = callbacks {
            (callbacks.1)(BackendError::PermissionDenied(reason.into()));
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl MeasurementBackend for FakeBackend {
    fn subscribe_live(
        &self,
        live_ref: &LiveRef,
        on_value: ValueCallback,
        on_error: ErrorCallback,
    ) -> Subscription {
        let path = live_ref.path().to_string();
        on_value(self.values.lock().unwrap().get(&path).copied().flatten());
        self.subscribers
            .lock()
            .unwrap()
            .insert(path.clone(), Arc::new((on_value, on_error)));

        let (subscribers, cancelled) = (self.subscribers.clone(), self.cancelled.clone());
        Subscription::new(move || {
            subscribers.lock().unwrap().remove(&path);
            cancelled.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn fetch_all_documents(
        &self,
        collection: &CollectionRef,
    ) -> Result<Vec<MeasurementRecord>, BackendError> {
        assert_eq!(collection.name(), "measurements");
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.recv().unwrap();
        }

        self.documents
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BackendError::Malformed("offline".into()))
    }
}

#[derive(Default)]
struct RecordingView {
    frames: Mutex<Vec<ViewState>>,
}

impl RecordingView {
    fn last(&self) -> ViewState {
        self.frames.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl DashboardView for RecordingView {
    fn render(&self, state: &ViewState) {
        self.frames.lock().unwrap().push(state.clone());
    }
}

fn record(humidity: f64, temperature: f64, seconds: i64) -> MeasurementRecord {
    MeasurementRecord::new(humidity, temperature, Some(Timestamp::new(seconds, 0)))
}

fn setup(backend: FakeBackend) -> (Arc<FakeBackend>, Arc<RecordingView>, Dashboard) {
    let backend = Arc::new(backend);
    let view = Arc::new(RecordingView::default());
    let dashboard = Dashboard::new(backend.clone(), view.clone());
    dashboard.mount();
    (backend, view, dashboard)
}

#[test]
fn test_live_values_render() {
    let (backend, view, dashboard) = setup(FakeBackend::default());

    assert_eq!(view.last().humidity_text(), "Loading...");
    assert_eq!(view.last().temperature_text(), "Loading...");

    backend.push("data/humidity", Some(55.0));
    assert_eq!(view.last().humidity_text(), "55%");
    assert_eq!(view.last().temperature_text(), "Loading...");

    backend.push("data/temperature", Some(21.0));
    assert_eq!(view.last().temperature_text(), "21°C");

    backend.push("data/temperature", Some(22.5));
    assert_eq!(dashboard.state().temperature_text(), "22.5°C");
}

#[test]
fn test_current_value_delivered_on_mount() {
    let backend = FakeBackend::default();
    backend.push("data/humidity", Some(40.0));

    let (_backend, view, _dashboard) = setup(backend);
    assert_eq!(view.last().humidity_text(), "40%");
}

#[test]
fn test_history_fetched_once_per_expansion() {
    let (backend, view, dashboard) = setup(FakeBackend::with_documents(vec![
        record(50.0, 20.0, 1_600_000_000),
        record(51.0, 21.0, 1_600_003_600),
    ]));

    dashboard.toggle_history().unwrap().join().unwrap();
    let state = view.last();
    assert!(state.show_table());
    assert_eq!(state.previous_measurements.len(), 2);
    assert_eq!(backend.fetch_count(), 1);

    assert!(dashboard.toggle_history().is_none());
    assert!(!view.last().show_table());
    assert_eq!(backend.fetch_count(), 1);

    dashboard.toggle_history().unwrap().join().unwrap();
    assert!(view.last().show_table());
    assert_eq!(backend.fetch_count(), 2);
}

#[test]
fn test_failed_fetch_still_shows_table() {
    let (backend, view, dashboard) = setup(FakeBackend::default());

    dashboard.toggle_history().unwrap().join().unwrap();

    let state = view.last();
    assert!(state.show_table());
    assert!(state.previous_measurements.is_empty());
    assert!(state.last_error.unwrap().contains("offline"));
    assert_eq!(backend.fetch_count(), 1);
}

#[test]
fn test_toggle_ignored_while_fetching() {
    let (backend, _view, dashboard) = setup(FakeBackend::with_documents(vec![record(
        50.0,
        20.0,
        1_600_000_000,
    )]));
    let release = backend.hold_next_fetch();

    let worker = dashboard.toggle_history().unwrap();
    assert_eq!(dashboard.state().history, HistoryPanel::Fetching);
    assert!(dashboard.toggle_history().is_none());
    assert!(dashboard.toggle_history().is_none());

    release.send(()).unwrap();
    worker.join().unwrap();

    assert_eq!(backend.fetch_count(), 1);
    assert_eq!(dashboard.state().history, HistoryPanel::Expanded);
    assert_eq!(dashboard.state().previous_measurements.len(), 1);
}

#[test]
fn test_subscription_error_keeps_loading() {
    let (backend, view, _dashboard) = setup(FakeBackend::default());

    backend.fail("data/humidity", "permission_denied");

    let state = view.last();
    assert_eq!(state.humidity_text(), "Loading...");
    assert!(state.last_error.unwrap().contains("permission_denied"));

    // The failed stream delivers nothing more, the other one keeps going.
    backend.push("data/humidity", Some(60.0));
    backend.push("data/temperature", Some(19.0));
    assert_eq!(view.last().humidity_text(), "Loading...");
    assert_eq!(view.last().temperature_text(), "19°C");
}

#[test]
fn test_unmount_cancels_subscriptions() {
    let (backend, view, dashboard) = setup(FakeBackend::default());

    dashboard.unmount();
    assert_eq!(backend.cancelled.load(Ordering::SeqCst), 2);

    backend.push("data/humidity", Some(55.0));
    assert_eq!(view.last().humidity_text(), "Loading...");
}

#[test]
fn test_end_to_end() {
    let (backend, view, dashboard) = setup(FakeBackend::with_documents(vec![record(
        50.0,
        20.0,
        1_600_000_000,
    )]));

    backend.push("data/humidity", Some(55.0));
    backend.push("data/temperature", Some(21.0));

    let state = view.last();
    assert_eq!(format!("Humidity: {}", state.humidity_text()), "Humidity: 55%");
    assert_eq!(
        format!("Temperature: {}", state.temperature_text()),
        "Temperature: 21°C"
    );

    dashboard.toggle_history().unwrap().join().unwrap();

    let state = view.last();
    assert!(state.show_table());
    assert_eq!(state.previous_measurements.len(), 1);

    let row = &state.previous_measurements[0];
    assert_eq!(row.humidity_text(), "50%");
    assert_eq!(row.temperature_text(), "20°C");
    assert!(!row.time_text().is_empty());
}

/// Stalls the first render that shows humidity without temperature.
#[derive(Default)]
struct StallingView {
    frames: Mutex<Vec<ViewState>>,
}

impl DashboardView for StallingView {
    fn render(&self, state: &ViewState) {
        if state.humidity.is_loaded() && !state.temperature.is_loaded() {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        self.frames.lock().unwrap().push(state.clone());
    }
}

#[test]
fn test_concurrent_pushes_render_in_order() {
    let backend = Arc::new(FakeBackend::default());
    let view = Arc::new(StallingView::default());
    let dashboard = Dashboard::new(backend.clone(), view.clone());
    dashboard.mount();

    let humidity = {
        let backend = backend.clone();
        std::thread::spawn(move || backend.push("data/humidity", Some(55.0)))
    };
    let temperature = {
        let backend = backend.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            backend.push("data/temperature", Some(21.0))
        })
    };
    humidity.join().unwrap();
    temperature.join().unwrap();

    let shown = view.frames.lock().unwrap().last().cloned().unwrap();
    assert_eq!(shown, dashboard.state());
    assert_eq!(shown.humidity_text(), "55%");
    assert_eq!(shown.temperature_text(), "21°C");
}
