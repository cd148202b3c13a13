//! Canonical reading types.
//!
//! Every payload variant the service returns is normalized into a
//! [`Reading`] by [`crate::parser`]; nothing downstream looks at raw JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Placeholder rendered for any value that is missing or invalid.
pub const NO_DATA: &str = "N/D";

/// A numeric sensor value that is either a finite number or invalid.
///
/// Construction goes through [`Measurement::new`], so `NaN` and infinities
/// can never be stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Measurement(Option<f64>);

impl Measurement {
    pub const INVALID: Measurement = Measurement(None);

    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Measurement(Some(value))
        } else {
            Measurement::INVALID
        }
    }

    pub fn value(self) -> Option<f64> {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0.is_some()
    }

    /// Formats the value with `precision` decimals, or [`NO_DATA`].
    pub fn display(self, precision: usize) -> String {
        match self.0 {
            Some(v) => format!("{:.*}", precision, v),
            None => NO_DATA.to_string(),
        }
    }

    /// Like [`Measurement::display`] but appends `unit` to valid values only.
    pub fn display_with_unit(self, precision: usize, unit: &str) -> String {
        match self.0 {
            Some(v) => format!("{:.*}{}", precision, v, unit),
            None => NO_DATA.to_string(),
        }
    }
}

impl From<Option<f64>> for Measurement {
    fn from(value: Option<f64>) -> Self {
        value.map(Measurement::new).unwrap_or_default()
    }
}

/// Names a numeric field of a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Pm25,
    Pm10,
    Temperature,
    Humidity,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Pm25, Field::Pm10, Field::Temperature, Field::Humidity];

    pub fn label(self) -> &'static str {
        match self {
            Field::Pm25 => "PM2.5",
            Field::Pm10 => "PM10",
            Field::Temperature => "Temperature",
            Field::Humidity => "Humidity",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Field::Pm25 | Field::Pm10 => " µg/m³",
            Field::Temperature => "°C",
            Field::Humidity => "%",
        }
    }

    /// Decimals used when the field is shown to a person.
    pub fn precision(self) -> usize {
        match self {
            Field::Humidity => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One observation for one city.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: Option<DateTime<Utc>>,
    /// Set on rows coming from the multi-city history endpoint.
    pub city: Option<String>,
    /// Region (state) reported by history rows.
    pub state: Option<String>,
    pub pm25: Measurement,
    pub pm10: Measurement,
    pub temperature: Measurement,
    pub humidity: Measurement,
}

impl Reading {
    /// A reading whose every numeric field is invalid.
    pub fn unavailable() -> Self {
        Reading::default()
    }

    pub fn get(&self, field: Field) -> Measurement {
        match field {
            Field::Pm25 => self.pm25,
            Field::Pm10 => self.pm10,
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
        }
    }

    pub fn has_any_value(&self) -> bool {
        Field::ALL.iter().any(|f| self.get(*f).is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_rejects_non_finite() {
        assert!(!Measurement::new(f64::NAN).is_valid());
        assert!(!Measurement::new(f64::INFINITY).is_valid());
        assert!(!Measurement::new(f64::NEG_INFINITY).is_valid());
        assert_eq!(Measurement::new(12.5).value(), Some(12.5));
    }

    #[test]
    fn test_display_invalid_is_placeholder() {
        assert_eq!(Measurement::INVALID.display(1), "N/D");
        assert_eq!(Measurement::INVALID.display_with_unit(1, "°C"), "N/D");
        assert_eq!(Measurement::new(21.04).display_with_unit(1, "°C"), "21.0°C");
        assert_eq!(Measurement::new(63.6).display(0), "64");
    }

    #[test]
    fn test_unavailable_reading_has_no_values() {
        let reading = Reading::unavailable();
        assert!(!reading.has_any_value());
        for field in Field::ALL {
            assert!(!reading.get(field).is_valid());
        }
    }

    #[test]
    fn test_serializes_invalid_as_null() {
        let reading = Reading {
            pm25: Measurement::new(20.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["pm25"], 20.0);
        assert!(json["humidity"].is_null());
    }
}
