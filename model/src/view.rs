use crate::{LiveValue, MeasurementRecord, Quantity};

/// Visibility of the history table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryPanel {
    #[default]
    Collapsed,
    /// Waiting for the history fetch to finish, the table is still hidden.
    Fetching,
    Expanded,
}

/// What the caller of [`ViewState::toggle_history`] has to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    /// Fetch the collection and pass the outcome to [`ViewState::finish_fetch`].
    Fetch,
    Collapse,
    /// A fetch is already outstanding.
    Ignore,
}

/// Everything the dashboard displays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub humidity: LiveValue,
    pub temperature: LiveValue,
    pub previous_measurements: Vec<MeasurementRecord>,
    pub history: HistoryPanel,
    /// The most recent backend failure, kept for diagnostics only.
    pub last_error: Option<String>,
}

impl ViewState {
    pub fn live(&self, quantity: Quantity) -> LiveValue {
        match quantity {
            Quantity::Humidity => self.humidity,
            Quantity::Temperature => self.temperature,
        }
    }

    pub fn set_live(&mut self, quantity: Quantity, value: Option<f64>) {
        let value = LiveValue::new(value);
        match quantity {
            Quantity::Humidity => self.humidity = value,
            Quantity::Temperature => self.temperature = value,
        }
    }

    pub fn humidity_text(&self) -> String {
        self.humidity.render(Quantity::Humidity)
    }

    pub fn temperature_text(&self) -> String {
        self.temperature.render(Quantity::Temperature)
    }

    pub fn show_table(&self) -> bool {
        self.history == HistoryPanel::Expanded
    }

    pub fn is_fetching(&self) -> bool {
        self.history == HistoryPanel::Fetching
    }

    /// Handles a click on the history button.
    pub fn toggle_history(&mut self) -> HistoryAction {
        match self.history {
            HistoryPanel::Collapsed => {
                self.history = HistoryPanel::Fetching;
                HistoryAction::Fetch
            }
            HistoryPanel::Fetching => {
                log::debug!("History fetch already in flight, ignoring toggle");
                HistoryAction::Ignore
            }
            HistoryPanel::Expanded => {
                self.history = HistoryPanel::Collapsed;
                HistoryAction::Collapse
            }
        }
    }

    /// Completes a fetch started by [`ViewState::toggle_history`].
    ///
    /// The table opens whatever the outcome. On failure the previous rows are kept.
    pub fn finish_fetch<E: std::fmt::Display>(
        &mut self,
        result: Result<Vec<MeasurementRecord>, E>,
    ) {
        if self.history != HistoryPanel::Fetching {
            log::warn!("Dropping history fetch result, panel is {:?}", self.history);
            return;
        }

        match result {
            Ok(measurements) => self.previous_measurements = measurements,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        self.history = HistoryPanel::Expanded;
    }

    pub fn record_error<E: std::fmt::Display>(&mut self, error: E) {
        self.last_error = Some(error.to_string());
    }
}
