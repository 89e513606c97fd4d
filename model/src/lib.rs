mod live;
mod measurement;
mod view;

pub use live::{LiveValue, Quantity};
pub use measurement::{format_timestamp, format_timestamp_in, MeasurementRecord, Timestamp};
pub use view::{HistoryAction, HistoryPanel, ViewState};

/// Name of the document collection holding the measurement history.
pub const MEASUREMENTS_COLLECTION: &str = "measurements";
