/// The two quantities published live by the sensor node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quantity {
    Humidity,
    Temperature,
}

impl Quantity {
    pub const ALL: [Quantity; 2] = [Quantity::Humidity, Quantity::Temperature];

    /// Location of the value in the realtime database.
    pub fn path(self) -> &'static str {
        match self {
            Quantity::Humidity => "data/humidity",
            Quantity::Temperature => "data/temperature",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Quantity::Humidity => "%",
            Quantity::Temperature => "°C",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quantity::Humidity => "Humidity",
            Quantity::Temperature => "Temperature",
        }
    }

    /// Formats `value` with the unit of this quantity, e.g. `55%` or `21.5°C`.
    pub fn format(self, value: f64) -> String {
        format!("{value}{}", self.unit())
    }
}

/// The last value pushed by the backend for a [`Quantity`].
///
/// `None` means nothing has been received yet, or the backend holds no value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LiveValue(Option<f64>);

impl LiveValue {
    pub const LOADING_TEXT: &'static str = "Loading...";

    pub fn new(value: Option<f64>) -> Self {
        Self(value)
    }

    pub fn get(&self) -> Option<f64> {
        self.0
    }

    pub fn is_loaded(&self) -> bool {
        self.0.is_some()
    }

    /// Text shown in the status line for `quantity`.
    pub fn render(&self, quantity: Quantity) -> String {
        match self.0 {
            Some(value) => quantity.format(value),
            None => Self::LOADING_TEXT.to_string(),
        }
    }
}

#[test]
fn test_live_value_render() {
    assert_eq!(LiveValue::default().render(Quantity::Humidity), "Loading...");
    assert_eq!(LiveValue::new(Some(55.0)).render(Quantity::Humidity), "55%");
    assert_eq!(LiveValue::new(Some(21.0)).render(Quantity::Temperature), "21°C");
    assert_eq!(LiveValue::new(Some(21.5)).render(Quantity::Temperature), "21.5°C");
    assert_eq!(LiveValue::new(Some(-3.25)).render(Quantity::Temperature), "-3.25°C");
}

#[test]
fn test_quantity_paths() {
    assert_eq!(Quantity::Humidity.path(), "data/humidity");
    assert_eq!(Quantity::Temperature.path(), "data/temperature");
}
