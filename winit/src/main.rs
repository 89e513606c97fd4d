// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use std::sync::Arc;

use smart_city_common::backend::{BackendPointer, DummyBackend, FirebaseClient};
use smart_city_common::config::FirebaseConfig;
use smart_city_common::dashboard::{Dashboard, DashboardView};
use smart_city_model::{MeasurementRecord, ViewState};

/// Our App struct that holds the UI and the dashboard driving it.
///
/// The dashboard owns the live subscriptions and the history state, the App only binds the
/// history button and hands the window to the dashboard as its view.
struct App {
    ui: AppWindow,
    dashboard: Dashboard,
}

impl App {
    /// Create a new App struct.
    ///
    /// If no Firebase configuration is set at all, the bundled dummy measurements are shown.
    fn new() -> anyhow::Result<Self> {
        // Make a new AppWindow
        let ui = AppWindow::new()?;

        let backend = backend_from_env()?;
        let view = Arc::new(SlintView {
            ui: ui.as_weak(),
        });
        let dashboard = Dashboard::new(backend, view);

        // The history button toggles the table, fetching the collection when it opens.
        let toggle = dashboard.clone();
        ui.global::<ViewModel>().on_toggle_history(move || {
            // The fetch finishes on its own thread and renders when done.
            let _ = toggle.toggle_history();
        });

        Ok(Self { ui, dashboard })
    }

    /// Run the App: subscribe to the live values and run the UI until the window closes.
    fn run(&mut self) -> anyhow::Result<()> {
        self.dashboard.mount();

        // Run the UI (and map an error to an anyhow::Error).
        let result = self.ui.run().map_err(|e| e.into());

        self.dashboard.unmount();
        result
    }
}

/// Pick the backend from the Firebase configuration.
fn backend_from_env() -> anyhow::Result<BackendPointer> {
    let config = FirebaseConfig::load();

    if config.is_empty() {
        log::warn!("No Firebase configuration found, showing dummy measurements");
        return Ok(Arc::new(DummyBackend::new()?));
    }

    let missing = config.missing_keys();
    if !missing.is_empty() {
        log::warn!("Incomplete Firebase configuration, missing {}", missing.join(", "));
    }

    Ok(Arc::new(FirebaseClient::new(config)?))
}

/// Renders dashboard states into the window. Safe to call from any thread.
struct SlintView {
    ui: slint::Weak<AppWindow>,
}

impl DashboardView for SlintView {
    fn render(&self, state: &ViewState) {
        let humidity = slint::SharedString::from(state.humidity_text());
        let temperature = slint::SharedString::from(state.temperature_text());
        let show_table = state.show_table();
        let fetching = state.is_fetching();
        let rows: Vec<MeasurementRow> = state.previous_measurements.iter().map(Into::into).collect();

        let result = self.ui.upgrade_in_event_loop(move |ui| {
            let model = ui.global::<ViewModel>();
            model.set_humidity(humidity);
            model.set_temperature(temperature);
            model.set_fetching(fetching);
            model.set_show_table(show_table);
            model.set_records(slint::ModelRc::new(slint::VecModel::from(rows)));
        });

        if let Err(e) = result {
            log::warn!("Could not update the window: {e}");
        }
    }
}

/// Convert a measurement into a table row.
impl From<&MeasurementRecord> for MeasurementRow {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            humidity: record.humidity_text().into(),
            temperature: record.temperature_text().into(),
            time: record.time_text().into(),
        }
    }
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = App::new()?;

    app.run()
}
