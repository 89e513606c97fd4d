// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use smart_city_model::{HistoryAction, Quantity, ViewState, MEASUREMENTS_COLLECTION};

use crate::backend::{BackendPointer, Subscription};

/// Receives every new [`ViewState`]. May be called from any thread.
///
/// Renders happen with the state locked, so they arrive in the order the state changed.
/// Implementations must not call back into the [`Dashboard`].
pub trait DashboardView: Send + Sync {
    fn render(&self, state: &ViewState);
}

pub type DashboardViewPointer = Arc<dyn DashboardView>;

/// Drives the dashboard: live subscriptions, the history toggle and rendering.
///
/// Cloning is cheap, all clones share the same state.
#[derive(Clone)]
pub struct Dashboard {
    backend: BackendPointer,
    view: DashboardViewPointer,
    state: Arc<Mutex<ViewState>>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Applies `update` and renders the result before releasing the lock.
fn update_and_render(
    state: &Mutex<ViewState>,
    view: &dyn DashboardView,
    update: impl FnOnce(&mut ViewState),
) {
    let mut state = lock(state);
    update(&mut state);
    view.render(&state);
}

impl Dashboard {
    pub fn new(backend: BackendPointer, view: DashboardViewPointer) -> Self {
        Self {
            backend,
            view,
            state: Arc::default(),
            subscriptions: Arc::default(),
        }
    }

    /// Renders the initial state and subscribes to all live values.
    pub fn mount(&self) {
        self.view.render(&lock(&self.state));

        let subscriptions: Vec<Subscription> = Quantity::ALL
            .into_iter()
            .map(|quantity| self.subscribe(quantity))
            .collect();

        lock(&self.subscriptions).extend(subscriptions);
    }

    fn subscribe(&self, quantity: Quantity) -> Subscription {
        let live_ref = self.backend.live_ref(quantity.path());
        log::info!("Subscribing to {}", live_ref.path());

        let (state, view) = (self.state.clone(), self.view.clone());
        let on_value = Box::new(move |value: Option<f64>| {
            log::debug!("{}: {value:?}", quantity.label());
            update_and_render(&state, view.as_ref(), |state| {
                state.set_live(quantity, value)
            });
        });

        let (state, view) = (self.state.clone(), self.view.clone());
        let on_error = Box::new(move |error: crate::backend::BackendError| {
            log::error!("Error fetching {}: {error}", quantity.label().to_lowercase());
            update_and_render(&state, view.as_ref(), |state| state.record_error(&error));
        });

        self.backend.subscribe_live(&live_ref, on_value, on_error)
    }

    /// Cancels all live subscriptions.
    pub fn unmount(&self) {
        let subscriptions = std::mem::take(&mut *lock(&self.subscriptions));
        log::info!("Cancelling {} subscriptions", subscriptions.len());
    }

    /// Shows or hides the history table.
    ///
    /// Showing it reads the whole collection on a worker thread, whose handle is returned.
    /// Toggles while a read is in flight are ignored.
    pub fn toggle_history(&self) -> Option<JoinHandle<()>> {
        let mut action = HistoryAction::Ignore;
        update_and_render(&self.state, self.view.as_ref(), |state| {
            action = state.toggle_history()
        });

        if action != HistoryAction::Fetch {
            return None;
        }

        let (backend, state, view) = (self.backend.clone(), self.state.clone(), self.view.clone());
        let worker = std::thread::Builder::new()
            .name("history-fetch".into())
            .spawn(move || {
                let collection = backend.collection(MEASUREMENTS_COLLECTION);
                let result = backend.fetch_all_documents(&collection);

                match &result {
                    Ok(records) => log::info!("Fetched {} previous measurements", records.len()),
                    Err(e) => log::error!("Error fetching previous measurements: {e}"),
                }
                update_and_render(&state, view.as_ref(), |state| state.finish_fetch(result));
            });

        match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Could not start history fetch: {e}");
                update_and_render(&self.state, self.view.as_ref(), |state| {
                    state.finish_fetch::<std::io::Error>(Err(e))
                });
                None
            }
        }
    }

    /// A copy of the current state.
    pub fn state(&self) -> ViewState {
        lock(&self.state).clone()
    }
}
